//! Application configuration management.
//!
//! Holds the default CSV source, the daily refresh window, parser and
//! request limits, and where to look for updates.
//!
//! Configuration is stored at `~/.config/csvcache/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::csv::MAX_ROWS;
use crate::error::CsvCacheError;
use crate::fetch::REQUEST_TIMEOUT_SECS;
use crate::freshness::FreshnessWindow;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "csvcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides `default_url`.
pub const URL_ENV_VAR: &str = "CSVCACHE_URL";

/// Source used when neither the request nor the config names one.
pub const DEFAULT_URL: &str = "https://example.com/sample.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_url: String,
    /// Local refresh cutoff, `"HH:MM"`.
    pub cutoff: String,
    pub utc_offset_hours: i32,
    pub max_rows: usize,
    pub request_timeout_secs: u64,
    pub update_manifest_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_url: DEFAULT_URL.to_string(),
            cutoff: "13:30".to_string(),
            utc_offset_hours: 7,
            max_rows: MAX_ROWS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            update_manifest_url: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            debug!(path = %path.display(), "Loaded config");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Take `default_url` from the environment when set and non-blank.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(URL_ENV_VAR) {
            self.apply_url_override(&url);
        }
    }

    fn apply_url_override(&mut self, url: &str) {
        let url = url.trim();
        if !url.is_empty() {
            self.default_url = url.to_string();
        }
    }

    pub fn window(&self) -> Result<FreshnessWindow, CsvCacheError> {
        FreshnessWindow::parse(&self.cutoff, self.utc_offset_hours)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
