//! Branded ID newtypes.
//!
//! Chat events carry an [`EventId`]. Producers may supply their own (the
//! welcome sentinel uses a fixed id) or let the dispatch façade generate one.
//! Generated ids are `evt_` followed by a UUID v7, so they sort roughly by
//! creation time.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix for generated event ids.
pub const EVENT_ID_PREFIX: &str = "evt_";

/// Unique identifier for an event in the chat log.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{EVENT_ID_PREFIX}{}", Uuid::now_v7()))
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id was produced by [`EventId::generate`].
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.0
            .strip_prefix(EVENT_ID_PREFIX)
            .is_some_and(|rest| Uuid::parse_str(rest).is_ok())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::generate()
    }
}

impl std::ops::Deref for EventId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
