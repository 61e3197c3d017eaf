//! Layered settings resolution.
//!
//! The user file only needs the keys it changes: it is merged key by key
//! over the serialized defaults, so `{"messages": {"tile": {"swap": false}}}`
//! leaves every other toggle at its default. A `null` in the file means
//! "keep the default". `MAPCHAT_*` variables are applied last.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::ChatSettings;

/// Env var toggling diagnostic messages.
pub const ENV_DEBUG_MESSAGES: &str = "MAPCHAT_DEBUG_MESSAGES";

/// Env var overrides for per-operation tile toggles, as `(var, operation)`.
pub const ENV_TILE_FLAGS: &[(&str, &str)] = &[
    ("MAPCHAT_SHOW_TILE_EDIT", "edit"),
    ("MAPCHAT_SHOW_TILE_CREATE", "create"),
    ("MAPCHAT_SHOW_TILE_DELETE", "delete"),
    ("MAPCHAT_SHOW_TILE_MOVE", "move"),
    ("MAPCHAT_SHOW_TILE_SWAP", "swap"),
];

/// Resolve the path to the settings file (`~/.mapchat/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
    home.join(".mapchat").join("settings.json")
}

/// Resolve settings from `~/.mapchat/settings.json` and the environment.
pub fn load_settings() -> Result<ChatSettings> {
    load_settings_from_path(&settings_path())
}

/// Resolve settings from `path` and the environment.
///
/// A missing file yields defaults. Invalid JSON, or a document whose root
/// is not an object, is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ChatSettings> {
    let defaults = serde_json::to_value(ChatSettings::default())?;

    let merged = if path.exists() {
        debug!(path = %path.display(), "reading chat settings");
        let overrides: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        if !overrides.is_object() {
            return Err(SettingsError::NotAnObject(path.to_path_buf()));
        }
        deep_merge(defaults, overrides)
    } else {
        debug!(path = %path.display(), "no chat settings file, using defaults");
        defaults
    };

    let mut settings: ChatSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

/// Merge `overlay` into `base`.
///
/// Objects merge per key, `null` keeps the base value, and anything else in
/// `overlay` replaces the base value outright.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay.into_iter().filter(|(_, v)| !v.is_null()) {
                let next = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                let _ = base.insert(key, next);
            }
            Value::Object(base)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Apply `MAPCHAT_*` overrides read through `lookup`.
///
/// Invalid booleans are logged and ignored, leaving the file/default value.
pub fn apply_env_overrides<F>(settings: &mut ChatSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = read_bool(&lookup, ENV_DEBUG_MESSAGES) {
        settings.messages.debug = v;
    }
    for (var, operation) in ENV_TILE_FLAGS {
        if let Some(v) = read_bool(&lookup, var) {
            if let Some(flag) = settings.messages.tile.flag_mut(operation) {
                *flag = v;
            }
        }
    }
}

/// Interpret an environment toggle, ignoring case and surrounding space.
pub fn parse_bool(raw: &str) -> Option<bool> {
    const ON: [&str; 4] = ["true", "1", "yes", "on"];
    const OFF: [&str; 4] = ["false", "0", "no", "off"];
    let normalized = raw.trim().to_ascii_lowercase();
    if ON.contains(&normalized.as_str()) {
        Some(true)
    } else if OFF.contains(&normalized.as_str()) {
        Some(false)
    } else {
        None
    }
}

fn read_bool<F>(lookup: &F, name: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    let parsed = parse_bool(&raw);
    if parsed.is_none() {
        warn!(var = name, value = %raw, "unrecognized toggle value, keeping configured setting");
    }
    parsed
}
