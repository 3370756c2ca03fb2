//! Configuration types module
//!
//! Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Filesystem layout
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    /// Directory holding user-servable files
    pub document_root: PathBuf,
    /// Directory holding the server's own resources
    pub system_root: PathBuf,
    /// Document served for `/`
    pub index_file: String,
    /// Error page under `system_root`
    pub not_found_file: String,
}

impl PathsConfig {
    /// Full path of the server's 404 page
    pub fn not_found_path(&self) -> PathBuf {
        self.system_root.join(&self.not_found_file)
    }
}

/// Content cache configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached files
    pub capacity: usize,
    /// Entry lifetime in seconds, 0 = never expires
    pub ttl: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub max_request_size: usize,
    pub max_response_size: usize,
}

/// Performance configuration (seconds, 0 = disabled)
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PerformanceConfig {
    pub read_timeout: u64,
    pub write_timeout: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}
