//! Bus error types.

use thiserror::Error;

/// Failures reported by listeners.
///
/// The bus never propagates these out of [`emit`](crate::EventBus::emit);
/// they are logged and counted in the delivery report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A listener returned an error.
    #[error("listener failed: {0}")]
    ListenerFailed(String),

    /// A listener panicked while handling the event.
    #[error("listener panicked: {0}")]
    ListenerPanicked(String),
}

/// Result type returned by listeners.
pub type Result<T> = std::result::Result<T, BusError>;
