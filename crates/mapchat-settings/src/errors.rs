//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Why chat settings could not be resolved.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read chat settings: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON, or does not fit the settings shape.
    #[error("malformed chat settings: {0}")]
    Json(#[from] serde_json::Error),
    /// The settings document parsed, but its root is not an object.
    #[error("chat settings in {} must be a JSON object", .0.display())]
    NotAnObject(PathBuf),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
