//! Request handler module
//!
//! Responsible for request routing dispatch and business logic processing:
//! the `/d20` endpoint and cached static file serving.

pub mod dice;
pub mod file_store;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use file_store::{FileBuffer, FileStore};
pub use router::{RequestPipeline, Response};
