//! # mapchat-settings
//!
//! Visibility settings read by the message derivation pass.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ChatSettings::default()`]
//! 2. **User file**: `~/.mapchat/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `MAPCHAT_*` overrides (highest priority)
//!
//! The engine never writes settings. It reads a snapshot through
//! [`SettingsSource`] each time it re-derives, so a host that flips a flag
//! through [`SharedSettings`] sees the change on the next log mutation or
//! explicit refresh.
//!
//! # Usage
//!
//! ```no_run
//! use mapchat_settings::{load_settings, SettingsSource};
//!
//! let settings = load_settings().unwrap_or_default();
//! println!("debug messages: {}", settings.snapshot().messages.debug);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod source;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use source::{SettingsSource, SharedSettings};
pub use types::*;
