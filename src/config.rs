use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::mta::engine::FetchPolicy;
use crate::mta::feeds::{FeedTable, MTA_FEED_BASE_URL};

/// Top-level configuration file structure. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    http: HttpConfig,
    #[serde(default)]
    feeds: RawFeedsConfig,
    stations_file: Option<PathBuf>,
    #[serde(default)]
    fetch_policy: FetchPolicy,
}

/// Feed table section: a base URL plus optional route overrides.
///
/// Route values are either absolute URLs or suffixes appended to `base_url`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFeedsConfig {
    base_url: Option<String>,
    routes: Option<BTreeMap<String, String>>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:5001".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
        }
    }
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    pub user_agent: Option<String>,
    /// Unset means no per-request timeout.
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub feed_table: FeedTable,
    pub stations_file: Option<PathBuf>,
    pub fetch_policy: FetchPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            http: HttpConfig::default(),
            feed_table: FeedTable::mta_default(MTA_FEED_BASE_URL),
            stations_file: None,
            fetch_policy: FetchPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&contents)
    }

    /// Parse config from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let base_url = raw
            .feeds
            .base_url
            .unwrap_or_else(|| MTA_FEED_BASE_URL.to_string());
        let feed_table = match raw.feeds.routes {
            Some(routes) => FeedTable::from_routes(
                routes
                    .into_iter()
                    .map(|(route, target)| {
                        let url = resolve_feed_url(&base_url, &target);
                        (route, url)
                    }),
            ),
            None => FeedTable::mta_default(&base_url),
        };

        let config = Config {
            server: raw.server,
            http: raw.http,
            feed_table,
            stations_file: raw.stations_file,
            fetch_policy: raw.fetch_policy,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.bind.parse().map_err(|_| {
            ConfigError::Validation(format!("bind must be host:port, got '{}'", self.server.bind))
        })
    }

    /// Validate config values are within acceptable ranges.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.http.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.feed_table.is_empty() {
            return Err(ConfigError::Validation(
                "feeds.routes cannot be empty".to_string(),
            ));
        }
        if let Some(route) = self.feed_table.routes().find(|r| r.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "feeds.routes has a blank route id '{}'",
                route
            )));
        }
        if let Some(endpoint) = self
            .feed_table
            .resolve(&HashSet::new())
            .into_iter()
            .find(|e| !is_absolute_url(e.as_str()))
        {
            return Err(ConfigError::Validation(format!(
                "feed URL must start with http:// or https://, got '{}'",
                endpoint
            )));
        }
        Ok(())
    }
}

fn is_absolute_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Absolute URLs are used as-is; anything else is a suffix on `base_url`.
fn resolve_feed_url(base_url: &str, target: &str) -> String {
    if is_absolute_url(target) {
        target.to_string()
    } else {
        format!("{}{}", base_url, target)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "Config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
