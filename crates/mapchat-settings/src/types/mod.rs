//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a partial
//! JSON document fills every missing field from [`Default`].

mod messages;

pub use messages::*;

use serde::{Deserialize, Serialize};

/// Root settings object consulted by the derivation engine.
///
/// ```json
/// { "messages": { "debug": false, "tile": { "create": false } } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    /// Message timeline visibility.
    pub messages: MessageSettings,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
