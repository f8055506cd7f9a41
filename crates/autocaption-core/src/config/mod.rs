//! Configuration management for autocaption.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a missing file or a
//! partial file both work.

mod types;
mod validate;

pub use types::*;
pub use validate::MAX_DELAY_SECS;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Upload limits
    pub limits: LimitsConfig,

    /// Caption generation settings
    pub caption: CaptionConfig,

    /// Hashtag settings
    pub hashtags: HashtagConfig,

    /// Post scheduler settings
    pub notifier: NotifierConfig,

    /// Caption job registry settings
    pub jobs: JobsConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Inference backend settings
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.autocaption.autocaption/config.toml
    /// - Linux: ~/.config/autocaption/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\autocaption\config\config.toml
    ///
    /// Falls back to ~/.autocaption/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "autocaption", "autocaption")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".autocaption").join("config.toml")
            })
    }

    /// Get the resolved upload directory (with ~ expansion).
    pub fn upload_dir(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.server.upload_dir);
        PathBuf::from(expanded.into_owned())
    }

    /// Maximum upload size in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        (self.limits.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
