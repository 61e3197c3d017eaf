//! Message timeline derivation.
//!
//! One pass over the log, at most one [`Message`] per event, in log order.

use mapchat_settings::ChatSettings;

use crate::derive::format::{navigation_message, operation_message};
use crate::types::{ChatEvent, ChatEventKind, Message, OperationResult};

/// Prefix of diagnostic messages produced in debug mode.
pub const DEBUG_PREFIX: &str = "[DEBUG]";

/// Build the visible message timeline from the full log.
pub fn derive_messages(log: &[ChatEvent], settings: &ChatSettings) -> Vec<Message> {
    log.iter()
        .filter_map(|event| message_for(event, settings))
        .collect()
}

/// What an event renders as.
enum Rendering {
    Text(String),
    /// Recognised but switched off by a visibility toggle.
    Hidden,
    /// Produces nothing outside debug mode.
    Silent,
}

fn render(event: &ChatEvent, settings: &ChatSettings) -> Rendering {
    match &event.kind {
        ChatEventKind::UserMessage(p)
        | ChatEventKind::SystemMessage(p)
        | ChatEventKind::Message(p) => Rendering::Text(p.content.clone()),
        ChatEventKind::OperationCompleted(p) if p.result == OperationResult::Success => {
            let visible = settings
                .messages
                .tile
                .visibility(p.operation.as_str())
                .unwrap_or(true);
            if visible {
                Rendering::Text(operation_message(p))
            } else {
                Rendering::Hidden
            }
        }
        ChatEventKind::Navigation(p) => Rendering::Text(navigation_message(p)),
        ChatEventKind::OperationCompleted(_)
        | ChatEventKind::TileSelected(_)
        | ChatEventKind::OperationStarted(_)
        | ChatEventKind::AuthRequired(_)
        | ChatEventKind::ErrorOccurred(_)
        | ChatEventKind::WidgetResolved(_)
        | ChatEventKind::ClearChat => Rendering::Silent,
    }
}

fn message_for(event: &ChatEvent, settings: &ChatSettings) -> Option<Message> {
    let content = match render(event, settings) {
        Rendering::Text(text) => text,
        Rendering::Hidden => return None,
        Rendering::Silent if settings.messages.debug => debug_content(event),
        Rendering::Silent => return None,
    };
    Some(Message {
        id: event.id.to_string(),
        content,
        actor: event.actor,
        timestamp: event.timestamp,
    })
}

/// `[DEBUG] tile_selected by user: {...}`
fn debug_content(event: &ChatEvent) -> String {
    format!(
        "{DEBUG_PREFIX} {} by {}: {}",
        event.type_name(),
        event.actor,
        event.kind.payload_json()
    )
}
