//! Dispatch façade.
//!
//! Callers describe an event as a [`PendingEvent`], leaving `id` and
//! `timestamp` out when they don't care. [`EventFactory::normalize`] fills
//! both in (`evt_<uuid v7>` and "now") and returns a complete [`ChatEvent`]
//! ready for the log. The factory holds no state besides its clock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mapchat_core::EventId;

use crate::log::WELCOME_MESSAGE_ID;
use crate::types::{Actor, ChatEvent, ChatEventKind, MessagePayload};

/// A caller-supplied event that may lack identity and time.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingEvent {
    /// Explicit id, or `None` to generate one.
    pub id: Option<EventId>,
    /// Originator.
    pub actor: Actor,
    /// Explicit time, or `None` for "now".
    pub timestamp: Option<DateTime<Utc>>,
    /// Type and payload.
    pub kind: ChatEventKind,
}

impl PendingEvent {
    /// Event with generated id and timestamp.
    pub fn new(actor: Actor, kind: ChatEventKind) -> Self {
        Self {
            id: None,
            actor,
            timestamp: None,
            kind,
        }
    }

    /// A `user_message`.
    pub fn user_message(content: impl Into<String>) -> Self {
        Self::new(
            Actor::User,
            ChatEventKind::UserMessage(MessagePayload::new(content)),
        )
    }

    /// A `system_message`.
    pub fn system_message(content: impl Into<String>) -> Self {
        Self::new(
            Actor::System,
            ChatEventKind::SystemMessage(MessagePayload::new(content)),
        )
    }

    /// The `clear_chat` control event.
    pub fn clear_chat() -> Self {
        Self::new(Actor::User, ChatEventKind::ClearChat)
    }

    /// Pin the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<EventId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Pin the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl From<ChatEvent> for PendingEvent {
    fn from(event: ChatEvent) -> Self {
        Self {
            id: Some(event.id),
            actor: event.actor,
            timestamp: Some(event.timestamp),
            kind: event.kind,
        }
    }
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Stamps defaults onto pending events.
#[derive(Clone)]
pub struct EventFactory {
    clock: Clock,
}

impl Default for EventFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFactory").finish_non_exhaustive()
    }
}

impl EventFactory {
    /// Factory using the system clock.
    pub fn new() -> Self {
        Self {
            clock: Arc::new(Utc::now),
        }
    }

    /// Factory using a custom clock.
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self {
            clock: Arc::new(clock),
        }
    }

    /// Fill in missing id and timestamp.
    pub fn normalize(&self, pending: PendingEvent) -> ChatEvent {
        ChatEvent {
            id: pending.id.unwrap_or_else(EventId::generate),
            actor: pending.actor,
            timestamp: pending.timestamp.unwrap_or_else(|| (self.clock)()),
            kind: pending.kind,
        }
    }

    /// The welcome sentinel: a system message with the reserved id.
    pub fn welcome_message(&self, content: impl Into<String>) -> ChatEvent {
        self.normalize(PendingEvent::system_message(content).with_id(WELCOME_MESSAGE_ID))
    }
}
