//! Configuration management for the exporter
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::Error;

/// Default upstream booking service
pub const DEFAULT_BASE_URL: &str = "https://www.doctolib.de";

/// Default catalog slug (Berlin vaccination centers)
pub const DEFAULT_REGION: &str = "ciz-berlin-berlin";

/// Default listen address for the metrics endpoint
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:2112";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream booking API configuration
    pub upstream: UpstreamConfig,

    /// Collection cycle configuration
    pub collection: CollectionConfig,

    /// Metrics server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Upstream booking API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the booking service
    pub base_url: String,

    /// Catalog slug, e.g. `ciz-berlin-berlin`
    pub region: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent string
    pub user_agent: String,
}

/// Collection cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Maximum number of availability requests in flight at once
    pub max_concurrent_fetches: usize,

    /// Deadline for the whole fan-out phase in seconds
    pub fanout_deadline_secs: u64,
}

/// Metrics server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the `/metrics` endpoint listens on
    pub bind_address: SocketAddr,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn default_user_agent() -> String {
    format!("impfwatch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 2112))
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            region: String::from(DEFAULT_REGION),
            request_timeout_secs: 10,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 16,
            fanout_deadline_secs: 25,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            collection: CollectionConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let base_url =
            std::env::var("IMPFWATCH_BASE_URL").unwrap_or(defaults.upstream.base_url);

        let region = std::env::var("IMPFWATCH_REGION").unwrap_or(defaults.upstream.region);

        let request_timeout_secs = env_parsed::<u64>("IMPFWATCH_REQUEST_TIMEOUT")
            .unwrap_or(defaults.upstream.request_timeout_secs);

        let user_agent =
            std::env::var("IMPFWATCH_USER_AGENT").unwrap_or(defaults.upstream.user_agent);

        let max_concurrent_fetches = env_parsed::<usize>("IMPFWATCH_MAX_CONCURRENT_FETCHES")
            .unwrap_or(defaults.collection.max_concurrent_fetches);

        let fanout_deadline_secs = env_parsed::<u64>("IMPFWATCH_FANOUT_DEADLINE")
            .unwrap_or(defaults.collection.fanout_deadline_secs);

        let bind_address = env_parsed::<SocketAddr>("IMPFWATCH_BIND_ADDRESS")
            .unwrap_or(defaults.server.bind_address);

        let log_level = std::env::var("IMPFWATCH_LOG_LEVEL").unwrap_or(defaults.logging.level);

        let log_format = std::env::var("IMPFWATCH_LOG_FORMAT").unwrap_or(defaults.logging.format);

        Ok(Self {
            upstream: UpstreamConfig {
                base_url,
                region,
                request_timeout_secs,
                user_agent,
            },
            collection: CollectionConfig {
                max_concurrent_fetches,
                fanout_deadline_secs,
            },
            server: ServerConfig { bind_address },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> crate::error::Result<()> {
        let base = Url::parse(&self.upstream.base_url).map_err(|e| {
            Error::config(format!("Invalid base_url {}: {e}", self.upstream.base_url))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base_url must use http or https, got {}",
                base.scheme()
            )));
        }

        if self.upstream.region.trim().is_empty() {
            return Err(Error::config("region must not be empty"));
        }

        if self.upstream.region.contains('/') {
            return Err(Error::config("region must be a single path segment"));
        }

        if self.upstream.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be greater than 0"));
        }

        if self.collection.max_concurrent_fetches == 0 {
            return Err(Error::config("max_concurrent_fetches must be greater than 0"));
        }

        if self.collection.fanout_deadline_secs == 0 {
            return Err(Error::config("fanout_deadline_secs must be greater than 0"));
        }

        Ok(())
    }
}

impl UpstreamConfig {
    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl CollectionConfig {
    /// Get fan-out deadline as Duration
    #[must_use]
    pub fn fanout_deadline(&self) -> Duration {
        Duration::from_secs(self.fanout_deadline_secs)
    }
}
