//! # mapchat-core
//!
//! Foundation types shared by every mapchat crate:
//!
//! - **Branded IDs**: [`EventId`](ids::EventId) as a newtype so event ids are
//!   never confused with widget keys or tile ids
//! - **Logging**: [`init_subscriber`](logging::init_subscriber) for binaries and
//!   [`capture_logs`](logging::capture_logs) for asserting on `tracing` output in tests

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;

pub use ids::EventId;
