//! Derived, transient output types. Rebuilt wholesale on every derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::event::Actor;

/// One entry of the visible message timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Id of the source event.
    pub id: String,
    /// Rendered text (may contain markdown links).
    pub content: String,
    /// Who it is attributed to.
    pub actor: Actor,
    /// Source event time.
    pub timestamp: DateTime<Utc>,
}

/// Kind of interactive widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetType {
    /// Tile preview.
    Preview,
    /// Tile creation form.
    Creation,
    /// Delete confirmation.
    Delete,
    /// Login prompt.
    Login,
    /// Error banner.
    Error,
}

impl WidgetType {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Creation => "creation",
            Self::Delete => "delete",
            Self::Login => "login",
            Self::Error => "error",
        }
    }

    /// Advisory priority for the UI. The engine never filters on it.
    pub fn priority(self) -> WidgetPriority {
        match self {
            Self::Preview => WidgetPriority::Info,
            Self::Creation | Self::Login => WidgetPriority::Action,
            Self::Delete | Self::Error => WidgetPriority::Critical,
        }
    }
}

/// Advisory widget priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetPriority {
    /// Needs attention now.
    Critical,
    /// Waits for user input.
    Action,
    /// Informational.
    Info,
}

/// Display payload of a widget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WidgetData {
    /// Tile preview.
    #[serde(rename_all = "camelCase")]
    Preview {
        /// Previewed tile.
        tile_id: String,
        /// Tile title.
        title: String,
        /// Tile body.
        content: String,
        /// Tile coordinate.
        coord_id: String,
        /// Start in edit mode.
        open_in_edit_mode: bool,
    },
    /// Creation form.
    #[serde(rename_all = "camelCase")]
    Creation {
        /// Where the new tile goes.
        coord_id: Option<String>,
        /// Parent tile.
        parent_id: Option<String>,
        /// Parent display name.
        parent_name: Option<String>,
    },
    /// Delete confirmation.
    #[serde(rename_all = "camelCase")]
    Delete {
        /// Tile to delete.
        tile_id: Option<String>,
        /// Its display name.
        tile_name: Option<String>,
    },
    /// Login prompt.
    Login {
        /// Why login is needed.
        reason: Option<String>,
    },
    /// Error banner.
    Error {
        /// Error text.
        message: String,
        /// Whether retrying may help.
        retryable: bool,
        /// Producer context.
        context: Option<Value>,
    },
}

/// An active interactive widget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    /// Deterministic key, e.g. `preview-t1`, `error-evt_...`, `login-widget`.
    pub id: String,
    /// Widget kind.
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    /// Display payload.
    pub data: WidgetData,
    /// Advisory priority.
    pub priority: WidgetPriority,
    /// Time of the event that produced it.
    pub timestamp: DateTime<Utc>,
}
