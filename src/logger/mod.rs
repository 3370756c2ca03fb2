//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{AccessLogEntry, CacheOutcome};

use writer::Channel;

use crate::cache::ContentCache;
use crate::config::Config;
use std::net::SocketAddr;
use std::str::FromStr;

/// Log verbosity, ordered from quietest to noisiest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config.logging.level.parse().unwrap_or_else(|e| {
        eprintln!("[WARN] {e}, falling back to info");
        Level::Info
    });
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        level,
    )
}

fn enabled(level: Level) -> bool {
    writer::get().map_or(level <= Level::Info, |w| level <= w.level())
}

fn write_info(message: &str) {
    if enabled(Level::Info) {
        writer::emit(Channel::Access, message);
    }
}

fn write_error(level: Level, message: &str) {
    if enabled(level) {
        writer::emit(Channel::Error, message);
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    write_info(&format!(
        "Document root: {}",
        config.paths.document_root.display()
    ));
    write_info(&format!(
        "System files: {}",
        config.paths.system_root.display()
    ));
    write_info(&format!("Cache capacity: {} entries", config.cache.capacity));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("Handling connections sequentially");
    write_info("======================================\n");
}

pub fn log_server_stop(cache: &ContentCache) {
    write_info(&format!("[Shutdown] {}", cache_summary(cache)));
    write_info("[Shutdown] Server stopped");
}

/// One-line account of what the content cache did over the server's lifetime
pub fn cache_summary(cache: &ContentCache) -> String {
    let stats = cache.stats();
    format!(
        "Cache: {}/{} entries, {} bytes resident, {} hits, {} misses ({:.1}% hit rate), {} evictions, {} expirations",
        cache.len(),
        cache.capacity(),
        stats.resident_bytes,
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0,
        stats.evictions,
        stats.expirations,
    )
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &impl std::fmt::Display) {
    write_error(
        Level::Error,
        &format!("[ERROR] Failed to serve connection from {peer_addr}: {err}"),
    );
}

pub fn log_cache_event(event: &str, key: &str) {
    log_debug(&format!("[Cache] {event}: {key}"));
}

pub fn log_error(message: &str) {
    write_error(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(Level::Warn, &format!("[WARN] {message}"));
}

pub fn log_debug(message: &str) {
    if enabled(Level::Debug) {
        writer::emit(Channel::Access, &format!("[DEBUG] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    writer::emit(Channel::Access, &entry.format(format));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!("info".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("trace".parse::<Level>().unwrap(), Level::Debug);
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn test_cache_summary() {
        let mut cache = ContentCache::new(2, 0);
        cache.put("/a", "text/plain", b"abc", 3);
        assert!(cache.get("/a").is_some());
        assert!(cache.get("/b").is_none());
        assert!(cache.get("/a").is_some());
        cache.put("/b", "text/plain", b"de", 2);
        cache.put("/c", "text/plain", b"f", 1);

        assert_eq!(
            cache_summary(&cache),
            "Cache: 2/2 entries, 3 bytes resident, 2 hits, 1 misses (66.7% hit rate), 1 evictions, 0 expirations"
        );
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Error < Level::Warn);
        assert!(Level::Info < Level::Debug);
    }
}
