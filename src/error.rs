//! Error types for rescache
//!
//! All fallible modules use `RescacheResult<T>` as their return type. The
//! cache operations themselves (`load`/`save`) never return errors; their
//! failures are logged and degrade to a cache miss.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rescache operations
pub type RescacheResult<T> = Result<T, RescacheError>;

/// All errors that can occur in rescache
#[derive(Error, Debug)]
pub enum RescacheError {
    // Cache errors
    #[error("Invalid resource id {id:?}: {reason}")]
    InvalidResourceId { id: String, reason: String },

    #[error("No tokio runtime available to drive cache operations")]
    NoRuntime,

    #[error("Failed to wipe cache directory {path}: {source}")]
    CacheWipe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Settings errors
    #[error("Invalid settings file at {path}: {reason}")]
    SettingsInvalid { path: PathBuf, reason: String },

    #[error("Setting {key} has an unexpected type: {reason}")]
    SettingType { key: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl RescacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid resource id error
    pub fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResourceId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidResourceId { .. } => {
                Some("Resource names must be non-empty and must not contain '@'")
            }
            Self::CacheWipe { .. } => {
                Some("Check permissions on the cache directory, then retry: rescache clear")
            }
            Self::ConfigInvalid { .. } => Some("Run: rescache config init --force"),
            Self::SettingsInvalid { .. } => Some("Fix or remove the settings file"),
            _ => None,
        }
    }
}
