//! # mapchat-events
//!
//! Event-sourced core of the chat panel.
//!
//! - **Chat events**: [`ChatEvent`] with a typed [`ChatEventKind`] payload union
//! - **Event log**: [`EventLog`], append-only except for the `clear_chat` reset
//!   that keeps only the welcome sentinel
//! - **Dispatch façade**: [`EventFactory`] stamps ids and timestamps onto
//!   [`PendingEvent`]s
//! - **Derivation engine**: [`derive::derive`] replays the whole log into the
//!   message timeline and the active widget set; [`derive::LifecycleTable`]
//!   is the incremental widget lifecycle kept in step with the log
//!
//! Derivation is pure. The same log and settings always produce the same
//! projections, and nothing in this crate holds mutable state between calls.

#![deny(unsafe_code)]

pub mod derive;
pub mod factory;
pub mod log;
pub mod types;

pub use derive::{
    LifecycleTable, Projection, Transition, WidgetState, derive, derive_messages, derive_widgets,
};
pub use factory::{EventFactory, PendingEvent};
pub use log::{EventLog, WELCOME_MESSAGE_ID, append};
pub use types::*;
