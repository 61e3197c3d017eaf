//! Ingestion boundary.
//!
//! Translates namespaced bus events (`map.*`, `auth.*`, `error.*`) into the
//! flat chat vocabulary. This is the only place payloads are schema-checked:
//! anything that fails to parse is rejected here and never reaches the log.
//!
//! | bus type               | chat event                                  |
//! |------------------------|---------------------------------------------|
//! | `map.tile_selected`    | `tile_selected`                             |
//! | `map.create_requested` | `operation_started` (create)                |
//! | `map.delete_requested` | `operation_started` (delete)                |
//! | `map.tile_created`     | `operation_completed` (create)              |
//! | `map.tile_updated`     | `operation_completed` (edit)                |
//! | `map.tile_deleted`     | `operation_completed` (delete)              |
//! | `map.tile_moved`       | `operation_completed` (move)                |
//! | `map.tiles_swapped`    | `operation_completed` (swap)                |
//! | `map.navigation`       | `navigation`                                |
//! | `auth.required`        | `auth_required`                             |
//! | `auth.login`           | `widget_resolved` for the login prompt      |
//! | `auth.logout`          | `system_message`                            |
//! | `error.occurred`       | `error_occurred`                            |

use mapchat_bus::BusEvent;
use mapchat_events::derive::LOGIN_WIDGET_KEY;
use mapchat_events::{
    Actor, AuthRequiredPayload, ChatEventKind, ErrorOccurredPayload, MessagePayload,
    NavigationPayload, OperationCompletedPayload, OperationKind, OperationResult,
    OperationStartedPayload, PendingEvent, TileSelectedPayload, WidgetResolvedPayload,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{IngestError, IngestResult};

/// Namespaces the session subscribes to for ingestion.
pub const INGEST_PATTERNS: [&str; 3] = ["map.*", "auth.*", "error.*"];

/// Text of the message recorded on logout.
pub const LOGOUT_MESSAGE: &str = "You have been logged out.";

// ─────────────────────────────────────────────────────────────────────────────
// Bus payloads
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequested {
    coord_id: String,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    parent_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequested {
    tile_id: String,
    tile_name: String,
}

/// `map.tile_created`, `map.tile_updated` and `map.tile_deleted`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileChanged {
    tile_id: String,
    tile_name: String,
    #[serde(default)]
    coord_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileMoved {
    tile_id: String,
    tile_name: String,
    to_coord_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TilesSwapped {
    tile1_id: String,
    tile1_name: String,
    tile2_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoggedIn {
    #[serde(default)]
    user_name: Option<String>,
}

/// Deserialize the payload; a missing payload reads as `{}`.
fn parse<T: DeserializeOwned>(event: &BusEvent) -> IngestResult<T> {
    let payload = match &event.payload {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(payload).map_err(|source| IngestError::InvalidPayload {
        event_type: event.event_type.clone(),
        source,
    })
}

fn completed(
    operation: OperationKind,
    tile_id: String,
    coord_id: Option<String>,
    message: String,
) -> ChatEventKind {
    ChatEventKind::OperationCompleted(OperationCompletedPayload {
        operation,
        result: OperationResult::Success,
        tile_id: Some(tile_id),
        coord_id,
        message,
    })
}

/// Translate one bus event.
///
/// `Ok(None)` means the type has no chat counterpart and the event is
/// ignored. The bus timestamp, when present, becomes the chat event's
/// timestamp; the id is always generated downstream.
pub fn translate(event: &BusEvent) -> IngestResult<Option<PendingEvent>> {
    let (actor, kind) = match event.event_type.as_str() {
        "map.tile_selected" => (
            Actor::User,
            ChatEventKind::TileSelected(parse::<TileSelectedPayload>(event)?),
        ),
        "map.create_requested" => {
            let p: CreateRequested = parse(event)?;
            (
                Actor::User,
                ChatEventKind::OperationStarted(OperationStartedPayload {
                    operation: OperationKind::Create,
                    coord_id: Some(p.coord_id),
                    parent_id: p.parent_id,
                    parent_name: p.parent_name,
                    ..Default::default()
                }),
            )
        }
        "map.delete_requested" => {
            let p: DeleteRequested = parse(event)?;
            (
                Actor::User,
                ChatEventKind::OperationStarted(OperationStartedPayload {
                    operation: OperationKind::Delete,
                    tile_id: Some(p.tile_id),
                    tile_name: Some(p.tile_name),
                    ..Default::default()
                }),
            )
        }
        "map.tile_created" => {
            let p: TileChanged = parse(event)?;
            let message = format!("Created tile \"{}\"", p.tile_name);
            (
                Actor::System,
                completed(OperationKind::Create, p.tile_id, p.coord_id, message),
            )
        }
        "map.tile_updated" => {
            let p: TileChanged = parse(event)?;
            let message = format!("Updated tile \"{}\"", p.tile_name);
            (
                Actor::System,
                completed(OperationKind::Edit, p.tile_id, p.coord_id, message),
            )
        }
        "map.tile_deleted" => {
            let p: TileChanged = parse(event)?;
            let message = format!("Deleted tile \"{}\"", p.tile_name);
            (
                Actor::System,
                completed(OperationKind::Delete, p.tile_id, p.coord_id, message),
            )
        }
        "map.tile_moved" => {
            let p: TileMoved = parse(event)?;
            let message = format!("Moved tile \"{}\"", p.tile_name);
            (
                Actor::System,
                completed(OperationKind::Move, p.tile_id, Some(p.to_coord_id), message),
            )
        }
        "map.tiles_swapped" => {
            let p: TilesSwapped = parse(event)?;
            let message = format!("Swapped \"{}\" with \"{}\"", p.tile1_name, p.tile2_name);
            (
                Actor::System,
                completed(OperationKind::Swap, p.tile1_id, None, message),
            )
        }
        "map.navigation" => (
            Actor::User,
            ChatEventKind::Navigation(parse::<NavigationPayload>(event)?),
        ),
        "auth.required" => (
            Actor::System,
            ChatEventKind::AuthRequired(parse::<AuthRequiredPayload>(event)?),
        ),
        "auth.login" => {
            let p: LoggedIn = parse(event)?;
            (
                Actor::User,
                ChatEventKind::WidgetResolved(WidgetResolvedPayload {
                    widget_id: LOGIN_WIDGET_KEY.to_string(),
                    action: Some(p.user_name.map_or_else(
                        || "login".to_string(),
                        |name| format!("login:{name}"),
                    )),
                }),
            )
        }
        "auth.logout" => (
            Actor::System,
            ChatEventKind::SystemMessage(MessagePayload::new(LOGOUT_MESSAGE)),
        ),
        "error.occurred" => (
            Actor::System,
            ChatEventKind::ErrorOccurred(parse::<ErrorOccurredPayload>(event)?),
        ),
        _ => return Ok(None),
    };

    let mut pending = PendingEvent::new(actor, kind);
    pending.timestamp = event.timestamp;
    Ok(Some(pending))
}
