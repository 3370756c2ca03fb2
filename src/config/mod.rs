//! Configuration module entry point
//!
//! Loads server configuration from file and environment with built-in defaults

mod types;

use std::net::SocketAddr;
use std::time::Duration;

use config::builder::DefaultState;
use config::ConfigBuilder;

use crate::error::ServerError;

// Re-export public types
pub use types::{
    CacheConfig, Config, HttpConfig, LoggingConfig, PathsConfig, PerformanceConfig, ServerConfig,
};

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (extension optional)
    /// A missing file is not an error; defaults and environment still apply
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        with_defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only, no file or environment
    pub fn defaults() -> Result<Self, config::ConfigError> {
        with_defaults()?.build()?.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| {
                ServerError::InvalidAddress(format!(
                    "{}:{} ({e})",
                    self.server.host, self.server.port
                ))
            })
    }

    /// Render the effective configuration for the startup log
    pub fn to_toml(&self) -> String {
        toml::to_string(self).unwrap_or_else(|e| format!("<unprintable config: {e}>"))
    }
}

impl PerformanceConfig {
    pub const fn read_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.read_timeout)
    }

    pub const fn write_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.write_timeout)
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 3490)?
        .set_default("paths.document_root", "./serverroot")?
        .set_default("paths.system_root", "./serverfiles")?
        .set_default("paths.index_file", "index.html")?
        .set_default("paths.not_found_file", "404.html")?
        .set_default("cache.capacity", 10)?
        .set_default("cache.ttl", 0)?
        .set_default("http.max_request_size", 65_536)?
        .set_default("http.max_response_size", 67_108_864)? // 64MB
        .set_default("performance.read_timeout", 0)?
        .set_default("performance.write_timeout", 0)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")
}

const fn timeout_from_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}
