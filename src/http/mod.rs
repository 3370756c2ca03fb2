//! HTTP protocol layer module
//!
//! Request line parsing, MIME detection and response framing, decoupled from
//! routing and file access.

pub mod mime;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use request::RequestLine;
pub use response::{ResponseFramer, Status};
