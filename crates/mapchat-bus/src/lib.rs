//! # mapchat-bus
//!
//! Typed publish/subscribe hub that carries cross-subsystem events
//! (`map.*`, `auth.*`, `error.*`) to whoever listens. It knows nothing about
//! chat semantics.
//!
//! ## Routing
//!
//! A listener subscribes with a pattern:
//! - an exact type (`map.tile_created`),
//! - a namespace wildcard (`map.*`, `map.tiles.*`) matching any type that
//!   has the namespace as a strict dot-separated prefix,
//! - the root wildcard `*`, matching everything.
//!
//! [`EventBus::emit`] delivers synchronously: exact listeners first, then
//! namespace wildcards from the most specific prefix outward, then `*`.
//! A listener registered under two matching patterns runs twice.
//!
//! ## Fault isolation
//!
//! Listener errors and panics are caught at the bus boundary, logged, and
//! swallowed. Every other listener still runs and `emit` never fails.
//!
//! ## Example
//!
//! ```rust,ignore
//! let bus = EventBus::new();
//! let sub = bus.on("map.*", |event: &BusEvent| {
//!     println!("{}", event.event_type);
//!     Ok(())
//! });
//! let _ = bus.emit(BusEvent::new("map.tile_created", "map", json!({})));
//! sub.unsubscribe();
//! ```

#![deny(unsafe_code)]

pub mod bus;
pub mod errors;
pub mod event;
pub mod pattern;

pub use bus::{DeliveryReport, EventBus, Listener, ListenerFailure, Subscription};
pub use errors::{BusError, Result};
pub use event::BusEvent;
pub use pattern::Pattern;
