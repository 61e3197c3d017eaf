//! Error types for ingestion and sessions.

use thiserror::Error;

/// A bus event that could not be turned into a chat event.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The bus type has no chat translation.
    #[error("unknown event type: {0}")]
    UnknownType(String),

    /// The payload does not match the schema of its type.
    #[error("invalid payload for {event_type}: {source}")]
    InvalidPayload {
        /// Bus type of the rejected event.
        event_type: String,
        /// Schema violation.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by [`ChatSession`](crate::ChatSession).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session was closed and accepts no more events.
    #[error("chat session is closed")]
    Closed,

    /// A bus event was rejected at ingestion.
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Result type for ingestion.
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
