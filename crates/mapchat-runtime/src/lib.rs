//! # mapchat-runtime
//!
//! Wires the chat core to the rest of the application.
//!
//! - **Ingestion**: [`translate`] turns namespaced bus events into chat
//!   events, rejecting malformed payloads before they reach the log
//! - **Session**: [`ChatSession`] owns the log, listens on the bus, and
//!   publishes a fresh [`ChatSnapshot`] after every change
//!
//! ```text
//! producer ──emit──▶ EventBus ──map.* / auth.* / error.*──▶ translate
//!                                                            │
//!                      dispatch(PendingEvent) ─────────────▶ ChatSession
//!                                                            │ append + derive
//!                                                            ▼
//!                                               watch::Receiver<ChatSnapshot>
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod ingest;
pub mod session;

pub use errors::{IngestError, IngestResult, Result, SessionError};
pub use ingest::{INGEST_PATTERNS, translate};
pub use session::{ChatSession, ChatSnapshot};
