//! Configuration schema for rescache
//!
//! Configuration is stored at `~/.config/rescache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache storage settings
    pub cache: CacheConfig,

    /// Session defaults
    pub session: SessionConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Full path of the cache root; defaults to the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Name of the cache root directory under the data directory
    pub directory: String,

    /// Write entries through a temp file and rename
    pub atomic_writes: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            directory: "Codable".to_string(),
            atomic_writes: true,
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Default user scope for CLI commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}
