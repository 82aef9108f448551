//! Persisted client settings.

use crate::error::ConfigError;
use crate::types::ExtractionConfig;
use crate::MAX_EXTRACTIONS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Hosted extraction API.
pub const DEFAULT_API_URL: &str = "https://orioris.controlcentralcarrier.com/api/v1";

/// Settings structure for persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Base URL of the extraction backend
    pub api_url: String,

    /// Maximum number of jobs held by one session
    pub max_extractions: usize,

    /// Initial values of the extraction form
    pub defaults: ExtractionConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            max_extractions: MAX_EXTRACTIONS,
            defaults: ExtractionConfig::default(),
        }
    }
}

impl Settings {
    /// `<config dir>/orioris/settings.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("orioris").join("settings.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load settings from disk.
    ///
    /// A missing file yields the defaults; so does a corrupted one, after a
    /// warning.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await?;

        let settings = serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to parse settings file, using defaults");
            Self::default()
        });

        Ok(settings)
    }

    /// Save settings to disk, creating parent directories as needed.
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;

        Ok(())
    }
}
