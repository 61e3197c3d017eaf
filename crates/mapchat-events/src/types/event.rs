//! The [`ChatEvent`] struct: the unit of chat history.

use std::fmt;

use chrono::{DateTime, Utc};
use mapchat_core::EventId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payloads::{
    AuthRequiredPayload, ErrorOccurredPayload, MessagePayload, NavigationPayload,
    OperationCompletedPayload, OperationStartedPayload, TileSelectedPayload,
    WidgetResolvedPayload,
};

/// Who caused an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    /// The person using the map.
    User,
    /// The application itself.
    System,
    /// The AI assistant.
    Assistant,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::System => "system",
            Self::Assistant => "assistant",
        })
    }
}

/// Type discriminator plus payload.
///
/// Derivation matches on this exhaustively; payload shape is guaranteed by
/// the type system once an event exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ChatEventKind {
    /// Text typed by the user.
    UserMessage(MessagePayload),
    /// Text produced by the application.
    SystemMessage(MessagePayload),
    /// Generic text message.
    Message(MessagePayload),
    /// A tile was selected.
    TileSelected(TileSelectedPayload),
    /// An operation began.
    OperationStarted(OperationStartedPayload),
    /// An operation finished.
    OperationCompleted(OperationCompletedPayload),
    /// The map centre moved.
    Navigation(NavigationPayload),
    /// Login required.
    AuthRequired(AuthRequiredPayload),
    /// An error surfaced.
    ErrorOccurred(ErrorOccurredPayload),
    /// A widget was closed.
    WidgetResolved(WidgetResolvedPayload),
    /// Reset the log to the welcome sentinel.
    ClearChat,
}

impl ChatEventKind {
    /// Wire name of the type, e.g. `tile_selected`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::UserMessage(_) => "user_message",
            Self::SystemMessage(_) => "system_message",
            Self::Message(_) => "message",
            Self::TileSelected(_) => "tile_selected",
            Self::OperationStarted(_) => "operation_started",
            Self::OperationCompleted(_) => "operation_completed",
            Self::Navigation(_) => "navigation",
            Self::AuthRequired(_) => "auth_required",
            Self::ErrorOccurred(_) => "error_occurred",
            Self::WidgetResolved(_) => "widget_resolved",
            Self::ClearChat => "clear_chat",
        }
    }

    /// Payload as JSON (`null` for payload-less types).
    pub fn payload_json(&self) -> Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|mut v| v.get_mut("payload").map(Value::take))
            .unwrap_or(Value::Null)
    }
}

/// One entry in the chat log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    /// Unique within a log.
    pub id: EventId,
    /// Originator.
    pub actor: Actor,
    /// Ordering and tie-breaking instant.
    pub timestamp: DateTime<Utc>,
    /// Type and payload.
    #[serde(flatten)]
    pub kind: ChatEventKind,
}

impl ChatEvent {
    /// Wire name of this event's type.
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Whether this is the `clear_chat` control event.
    pub fn is_clear(&self) -> bool {
        matches!(self.kind, ChatEventKind::ClearChat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChatEvent {
        ChatEvent {
            id: EventId::from("e1"),
            actor: Actor::User,
            timestamp: DateTime::parse_from_rfc3339("2025-03-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            kind: ChatEventKind::UserMessage(MessagePayload::new("hello")),
        }
    }

    #[test]
    fn serializes_flat_with_type_and_payload() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["id"], "e1");
        assert_eq!(json["actor"], "user");
        assert_eq!(json["type"], "user_message");
        assert_eq!(json["payload"]["content"], "hello");
    }

    #[test]
    fn clear_chat_has_no_payload() {
        let kind = ChatEventKind::ClearChat;
        assert_eq!(kind.type_name(), "clear_chat");
        assert_eq!(kind.payload_json(), Value::Null);
    }

    #[test]
    fn payload_json_extracts_payload() {
        let kind = ChatEventKind::WidgetResolved(WidgetResolvedPayload {
            widget_id: "login-widget".into(),
            action: None,
        });
        assert_eq!(
            kind.payload_json(),
            serde_json::json!({"widgetId": "login-widget"})
        );
    }

    #[test]
    fn type_names_match_serde_tags() {
        let kinds = [
            ChatEventKind::Message(MessagePayload::new("x")),
            ChatEventKind::AuthRequired(AuthRequiredPayload::default()),
            ChatEventKind::ClearChat,
        ];
        for kind in kinds {
            let json = serde_json::to_value(&kind).unwrap();
            assert_eq!(json["type"], kind.type_name());
        }
    }

    #[test]
    fn actor_display() {
        assert_eq!(Actor::Assistant.to_string(), "assistant");
    }
}
