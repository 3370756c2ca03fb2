//! A small static-content HTTP responder.
//!
//! Serves one request per connection from a document root, keeps recently
//! served files in an LRU cache, answers `/d20` with a random roll, and falls
//! back to its own 404 page for anything it cannot find.

pub mod cache;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
