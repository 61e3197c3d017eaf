//! Payload structs, one per chat event type.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Text carried by `user_message`, `system_message` and `message` events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    /// Message body. Producers may send it as `text` instead.
    #[serde(alias = "text")]
    pub content: String,
}

impl MessagePayload {
    /// Build from any string-like value.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Display data for a selected tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileData {
    /// Tile title.
    pub title: String,
    /// Tile body text.
    #[serde(default)]
    pub content: String,
    /// Map coordinate of the tile.
    pub coord_id: String,
}

/// `tile_selected`: the user picked a tile on the map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSelectedPayload {
    /// Selected tile.
    pub tile_id: String,
    /// What the preview shows.
    pub tile_data: TileData,
    /// Open the preview directly in edit mode.
    #[serde(default)]
    pub open_in_edit_mode: bool,
}

/// A map editing operation.
///
/// Serialized as its plain name. Names outside the known set survive as
/// [`OperationKind::Other`]; `update` is accepted as a synonym for `edit`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationKind {
    /// A tile is created.
    Create,
    /// A tile is edited.
    Edit,
    /// A tile is deleted.
    Delete,
    /// A tile is moved to another coordinate.
    Move,
    /// Two tiles swap positions.
    Swap,
    /// Any other operation name.
    Other(String),
}

impl OperationKind {
    /// Canonical name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Move => "move",
            Self::Swap => "swap",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for OperationKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "create" => Self::Create,
            "edit" | "update" => Self::Edit,
            "delete" => Self::Delete,
            "move" => Self::Move,
            "swap" => Self::Swap,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for OperationKind {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<OperationKind> for String {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a finished operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationResult {
    /// The operation went through.
    #[default]
    Success,
    /// The operation failed or was cancelled.
    #[serde(alias = "error", alias = "cancelled")]
    Failure,
}

/// `operation_started`: an operation awaits user input or server work.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStartedPayload {
    /// Which operation.
    pub operation: OperationKind,
    /// Tile being operated on, when it already exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_id: Option<String>,
    /// Display name of that tile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_name: Option<String>,
    /// Target coordinate (creation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord_id: Option<String>,
    /// Parent tile of a new tile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Display name of the parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
}

impl OperationStartedPayload {
    /// Entity this operation is about: the tile id, else the coordinate.
    pub fn target(&self) -> Option<&str> {
        self.tile_id.as_deref().or(self.coord_id.as_deref())
    }
}

impl Default for OperationKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

/// `operation_completed`: an operation finished.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationCompletedPayload {
    /// Which operation.
    pub operation: OperationKind,
    /// Outcome; absent means success.
    #[serde(default)]
    pub result: OperationResult,
    /// Affected tile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_id: Option<String>,
    /// Affected coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord_id: Option<String>,
    /// Human-readable summary, e.g. `Created tile "Roadmap"`.
    #[serde(default)]
    pub message: String,
}

impl OperationCompletedPayload {
    /// Whether an operation started for `target` is finished by this event.
    pub fn concerns(&self, target: &str) -> bool {
        self.tile_id.as_deref() == Some(target) || self.coord_id.as_deref() == Some(target)
    }
}

/// `navigation`: the map re-centred on another tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationPayload {
    /// Previous centre.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_center_id: Option<String>,
    /// Previous centre's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_center_name: Option<String>,
    /// New centre.
    pub to_center_id: String,
    /// New centre's name.
    pub to_center_name: String,
}

/// `auth_required`: the user must log in to continue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequiredPayload {
    /// Why login is needed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `error_occurred`: something failed and the user should know.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOccurredPayload {
    /// Error text.
    pub error: String,
    /// Extra producer-defined context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Whether retrying may help.
    #[serde(default)]
    pub retryable: bool,
}

/// `widget_resolved`: a widget was dismissed or acted upon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetResolvedPayload {
    /// Key of the widget being closed, e.g. `login-widget`.
    pub widget_id: String,
    /// What the user did (`confirm`, `cancel`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}
