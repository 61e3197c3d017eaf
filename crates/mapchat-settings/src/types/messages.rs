//! Message timeline visibility settings.

use serde::{Deserialize, Serialize};

/// Controls which events surface as chat messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageSettings {
    /// Emit a diagnostic message for every event that would otherwise
    /// produce nothing.
    pub debug: bool,
    /// Per-operation toggles for tile operation confirmations.
    pub tile: TileMessageSettings,
}

/// Per-operation visibility of successful tile operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct TileMessageSettings {
    /// Show "Updated tile ..." confirmations.
    pub edit: bool,
    /// Show "Created tile ..." confirmations.
    pub create: bool,
    /// Show "Deleted tile ..." confirmations.
    pub delete: bool,
    /// Show "Moved ..." confirmations.
    pub r#move: bool,
    /// Show "Swapped ..." confirmations.
    pub swap: bool,
}

impl Default for TileMessageSettings {
    fn default() -> Self {
        Self {
            edit: true,
            create: true,
            delete: true,
            r#move: true,
            swap: true,
        }
    }
}

impl TileMessageSettings {
    /// Visibility flag for a named operation.
    ///
    /// Returns `None` for operations without a toggle; callers show those
    /// unconditionally.
    pub fn visibility(&self, operation: &str) -> Option<bool> {
        match operation {
            "edit" => Some(self.edit),
            "create" => Some(self.create),
            "delete" => Some(self.delete),
            "move" => Some(self.r#move),
            "swap" => Some(self.swap),
            _ => None,
        }
    }

    /// Mutable access to a named toggle.
    pub fn flag_mut(&mut self, operation: &str) -> Option<&mut bool> {
        match operation {
            "edit" => Some(&mut self.edit),
            "create" => Some(&mut self.create),
            "delete" => Some(&mut self.delete),
            "move" => Some(&mut self.r#move),
            "swap" => Some(&mut self.swap),
            _ => None,
        }
    }
}
