//! Client configuration
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. `config.toml` under `GEORAG_HOME` (default: the platform config dir + `georag`)
//! 3. `GEORAG_BASE_URL` / `GEORAG_TOKEN` environment variables
//!
//! A missing config file is not an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::ConfigError;
use crate::stream::SplitStrategy;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Complete client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub stream: StreamConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    /// Whole-request timeout for REST calls; not applied to the completions stream
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Longest silence tolerated between two chunks of a streamed answer
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 300,
            connect_timeout_secs: 10,
            idle_timeout_secs: 300,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token sent with every request
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub split_strategy: SplitStrategy,
}

/// Directory holding georag configuration
///
/// `GEORAG_HOME` wins; otherwise the platform config dir.
pub fn georag_home() -> PathBuf {
    if let Ok(home) = std::env::var("GEORAG_HOME") {
        return PathBuf::from(home);
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("georag")
}

/// Default location of `config.toml`
pub fn config_path() -> PathBuf {
    georag_home().join("config.toml")
}

impl Config {
    /// Load from the default location and apply env overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&config_path())
    }

    /// Load from `path` and apply env overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(
            std::env::var("GEORAG_BASE_URL").ok(),
            std::env::var("GEORAG_TOKEN").ok(),
        );
        Ok(config)
    }

    /// Load from a specific path, returning defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override base URL and token; empty values are ignored
    pub fn apply_overrides(&mut self, base_url: Option<String>, token: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.server.base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.auth.token = Some(token);
        }
    }

    /// Parsed server base URL
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.server.base_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.server.base_url.clone(),
            source,
        })
    }
}
