//! Agent configuration
//!
//! Defines the directories the agent dumps between, how it reaches the
//! pub/sub sidecar and where it listens for pushed events.

use anyhow::Context;
use dumper_core::domain::topic::{DEFAULT_DUMP_PATH, DEFAULT_LOG_PATH};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Agent configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the logs are copied from
    pub log_path: PathBuf,

    /// Directory the logs are copied into
    pub dump_path: PathBuf,

    /// Sidecar base URL (e.g., "http://localhost:3500")
    pub sidecar_url: String,

    /// Pub/sub component name configured in the sidecar
    pub pubsub_name: String,

    /// Address of the subscription API the sidecar pushes events to
    pub bind_addr: String,

    /// How many dumps may run at the same time
    pub max_concurrent_dumps: usize,
}

impl Config {
    /// Creates a new configuration with defaults for everything but the paths
    pub fn new(log_path: impl Into<PathBuf>, dump_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            dump_path: dump_path.into(),
            sidecar_url: "http://localhost:3500".to_string(),
            pubsub_name: "mqtt-pubsub".to_string(),
            bind_addr: "0.0.0.0:50008".to_string(),
            max_concurrent_dumps: 1,
        }
    }

    /// Loads and validates configuration from the process environment
    ///
    /// Unset variables take their default; a variable that is set but
    /// malformed is an error rather than a silent fallback.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an explicit variable lookup
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let config = Self::from_lookup(lookup).context("Invalid configuration")?;
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Creates configuration from environment-style variables
    ///
    /// Every variable is optional:
    /// - LOG_PATH (default: /data/logs)
    /// - DUMP_PATH (default: /data/dump)
    /// - SIDECAR_URL (default: http://localhost:<DAPR_HTTP_PORT or 3500>)
    /// - PUBSUB_NAME (default: mqtt-pubsub)
    /// - BIND_ADDR (default: 0.0.0.0:50008)
    /// - MAX_CONCURRENT_DUMPS (default: 1)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup("LOG_PATH") {
            config.log_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("DUMP_PATH") {
            config.dump_path = PathBuf::from(path);
        }

        config.sidecar_url = match lookup("SIDECAR_URL") {
            Some(url) => url,
            None => match lookup("DAPR_HTTP_PORT") {
                Some(port) => {
                    let port = port
                        .parse::<u16>()
                        .map_err(|_| anyhow::anyhow!("DAPR_HTTP_PORT is not a port: {}", port))?;
                    format!("http://localhost:{}", port)
                }
                None => config.sidecar_url,
            },
        };

        if let Some(name) = lookup("PUBSUB_NAME") {
            config.pubsub_name = name;
        }

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(value) = lookup("MAX_CONCURRENT_DUMPS") {
            config.max_concurrent_dumps = value
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("MAX_CONCURRENT_DUMPS is not a number: {}", value))?;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.log_path.as_os_str().is_empty() {
            anyhow::bail!("log_path cannot be empty");
        }

        if self.dump_path.as_os_str().is_empty() {
            anyhow::bail!("dump_path cannot be empty");
        }

        if self.log_path == self.dump_path {
            anyhow::bail!("log_path and dump_path must differ");
        }

        // Aliases through symlinks or `..` would copy every log onto itself
        if let (Ok(logs), Ok(dump)) = (
            std::fs::canonicalize(&self.log_path),
            std::fs::canonicalize(&self.dump_path),
        ) {
            if logs == dump {
                anyhow::bail!(
                    "log_path and dump_path resolve to the same directory: {}",
                    logs.display()
                );
            }
        }

        if !self.sidecar_url.starts_with("http://") && !self.sidecar_url.starts_with("https://") {
            anyhow::bail!("sidecar_url must start with http:// or https://");
        }

        if self.pubsub_name.is_empty() {
            anyhow::bail!("pubsub_name cannot be empty");
        }

        if self.bind_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!("bind_addr is not a socket address: {}", self.bind_addr);
        }

        if self.max_concurrent_dumps == 0 {
            anyhow::bail!("max_concurrent_dumps must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PATH, DEFAULT_DUMP_PATH)
    }
}
