//! Server error types
//!
//! Every failure the request pipeline can hit is one variant here, so callers
//! can tell a missing user file from a missing system file from a socket fault.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Request line could not be parsed
    #[error("malformed request line: {0}")]
    MalformedRequest(String),

    /// Requested static file does not exist
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// One of the server's own resources (the 404 page) is missing
    #[error("system resource missing: {}", .0.display())]
    SystemResourceMissing(PathBuf),

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Socket read or write failed
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),

    #[error("response of {size} bytes exceeds limit of {limit} bytes")]
    ResponseTooLarge { size: usize, limit: usize },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl ServerError {
    /// Whether the error should stop the whole server rather than one request
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::SystemResourceMissing(_))
    }

    /// Process exit status used when this error terminates the server
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::SystemResourceMissing(_) => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
