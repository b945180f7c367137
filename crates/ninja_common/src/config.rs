//! Trader Ninja Configuration
//!
//! Config file: `$XDG_CONFIG_HOME/trader-ninja/config.toml`
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000"
//! timeout_secs = 15
//! token = "..."
//!
//! [cache]
//! path = "/home/me/.cache/trader-ninja/xp_cache.json"
//!
//! [log]
//! level = "info"
//! ```
//!
//! Environment overrides: `NINJA_API_URL`, `NINJA_API_TOKEN`,
//! `NINJA_API_TIMEOUT_SECS`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Directory name under the XDG config/cache roots
pub const APP_DIR: &str = "trader-ninja";

/// Default API base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Remote progression service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API
    pub base_url: String,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Bearer token sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            token: None,
        }
    }
}

/// Local XP cache settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache file; defaults to `$XDG_CACHE_HOME/trader-ninja/xp_cache.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// tracing filter directive, e.g. "info" or "ninja_common=debug"
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NinjaConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub log: LogConfig,
}

impl NinjaConfig {
    /// Default user config path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse config from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: NinjaConfig = toml::from_str(content).context("Failed to parse TOML")?;
        Ok(config)
    }

    /// Load config: explicit path, then user config, then defaults.
    /// Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => match Self::user_config_path() {
                Some(path) if path.exists() => Self::load_from(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `NINJA_API_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(url) = get("NINJA_API_URL").filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = get("NINJA_API_TOKEN").filter(|v| !v.is_empty()) {
            self.api.token = Some(token);
        }
        if let Some(raw) = get("NINJA_API_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %raw, "ignoring invalid NINJA_API_TIMEOUT_SECS"),
            }
        }
    }

    /// Resolved XP cache file path
    pub fn cache_path(&self) -> PathBuf {
        if let Some(path) = &self.cache.path {
            return path.clone();
        }
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join(APP_DIR)
            .join("xp_cache.json")
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
