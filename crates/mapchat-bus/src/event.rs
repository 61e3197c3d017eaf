//! The bus-level event envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event travelling over the bus.
///
/// `event_type` is a dot-namespaced identifier such as `map.tile_created`.
/// The payload is opaque to the bus; schema checks happen in whichever
/// listener consumes it.
///
/// ```json
/// { "type": "map.tile_created", "source": "map", "payload": {...}, "timestamp": "2025-..." }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusEvent {
    /// Namespaced event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Producing subsystem (`map`, `auth`, `chat`, ...).
    pub source: String,
    /// Event-specific data.
    #[serde(default)]
    pub payload: Value,
    /// When the event happened. Stamped by [`EventBus::emit`](crate::EventBus::emit)
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl BusEvent {
    /// Build an unstamped event.
    pub fn new(event_type: impl Into<String>, source: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            source: source.into(),
            payload,
            timestamp: None,
        }
    }

    /// Set an explicit timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
