//! The event log store.
//!
//! The log is the single source of truth. [`append`] is the only way it
//! changes: every event is appended at the end, except `clear_chat`, which
//! truncates the log to the welcome sentinel (or to nothing if the sentinel
//! is absent). Events are never edited or removed one by one. There is no
//! dedup by id and no length cap.
//!
//! [`EventLog`] wraps the sequence in an `Arc`. Appending builds a new
//! allocation and leaves the old one untouched, so holders of an older
//! `EventLog` can detect change with [`EventLog::ptr_eq`].

use std::sync::Arc;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::types::ChatEvent;

/// Id of the sentinel event that survives `clear_chat`.
pub const WELCOME_MESSAGE_ID: &str = "welcome-message";

/// Return `current` with `event` applied.
///
/// `current` is never modified.
pub fn append(current: &[ChatEvent], event: ChatEvent) -> Vec<ChatEvent> {
    if event.is_clear() {
        let retained: Vec<ChatEvent> = current
            .iter()
            .find(|e| e.id.as_str() == WELCOME_MESSAGE_ID)
            .cloned()
            .into_iter()
            .collect();
        debug!(
            dropped = current.len() - retained.len(),
            kept_sentinel = !retained.is_empty(),
            "chat log cleared"
        );
        return retained;
    }

    let mut next = Vec::with_capacity(current.len() + 1);
    next.extend_from_slice(current);
    next.push(event);
    next
}

/// Immutable, cheaply clonable log snapshot.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Arc<Vec<ChatEvent>>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log seeded with existing events (e.g. the welcome sentinel).
    pub fn from_events(events: Vec<ChatEvent>) -> Self {
        Self {
            events: Arc::new(events),
        }
    }

    /// New log with `event` applied; `self` is unchanged.
    #[must_use]
    pub fn append(&self, event: ChatEvent) -> Self {
        Self {
            events: Arc::new(append(&self.events, event)),
        }
    }

    /// Events in order.
    pub fn events(&self) -> &[ChatEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether both handles point at the same log version.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.events, &other.events)
    }
}

impl Serialize for EventLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.events.iter())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
