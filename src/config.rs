use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::search::filter::SearchFilter;

/// Default feed queried when no URL is configured
pub const DEFAULT_FEED_URL: &str = "https://feed.example.org/api/v2";

/// Timeout for feed requests in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// User agent sent with feed requests
pub const DEFAULT_USER_AGENT: &str = "feed-versions";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Feed configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedConfig {
    pub feed_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    pub user_agent: String,
    pub filter: SearchFilter,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            timeout_ms: FETCH_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            filter: SearchFilter::default(),
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_url.trim().is_empty() {
            return Err(ConfigError::Invalid("feedUrl must not be empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "timeoutMs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and validate a config file in JSON format
pub fn load_config(path: &Path) -> Result<FeedConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: FeedConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Returns the path to the data directory for feed-versions.
/// Uses $XDG_DATA_HOME/feed-versions if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/feed-versions,
/// or ./feed-versions if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the default config file.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("feed-versions.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("feed-versions")
}
