//! HTTP response framing module
//!
//! Serializes a status line, the fixed header set, and a body into one
//! wire-ready buffer.

use chrono::{DateTime, Utc};

use crate::error::ServerError;

/// Status lines the server emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
    MethodNotAllowed,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
        }
    }

    pub const fn status_line(self) -> &'static str {
        match self {
            Self::Ok => "HTTP/1.1 200 OK",
            Self::NotFound => "HTTP/1.1 404 NOT FOUND",
            Self::MethodNotAllowed => "HTTP/1.1 405 METHOD NOT ALLOWED",
        }
    }
}

/// Builds complete responses, refusing any larger than `max_response_size`
#[derive(Debug, Clone, Copy)]
pub struct ResponseFramer {
    max_response_size: usize,
}

impl ResponseFramer {
    pub const fn new(max_response_size: usize) -> Self {
        Self { max_response_size }
    }

    pub const fn max_response_size(&self) -> usize {
        self.max_response_size
    }

    /// Frame a response stamped with the current time
    pub fn frame(
        &self,
        status: Status,
        content_type: &str,
        body: &[u8],
        body_length: usize,
    ) -> Result<Vec<u8>, ServerError> {
        self.frame_at(status, content_type, body, body_length, Utc::now())
    }

    /// Frame a response with an explicit `Date`
    ///
    /// Headers always appear in the order `Date`, `Content-Length`,
    /// `Content-Type`, `Connection`. At most `body_length` bytes of `body`
    /// are written and `Content-Length` reports exactly that count.
    pub fn frame_at(
        &self,
        status: Status,
        content_type: &str,
        body: &[u8],
        body_length: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<u8>, ServerError> {
        let body = &body[..body_length.min(body.len())];
        let head = format!(
            "{}\r\nDate: {}\r\nContent-Length: {}\r\nContent-Type: {}\r\nConnection: close\r\n\r\n",
            status.status_line(),
            http_date(now),
            body.len(),
            content_type,
        );

        let size = head.len() + body.len();
        if size > self.max_response_size {
            return Err(ServerError::ResponseTooLarge {
                size,
                limit: self.max_response_size,
            });
        }

        let mut response = Vec::with_capacity(size);
        response.extend_from_slice(head.as_bytes());
        response.extend_from_slice(body);
        Ok(response)
    }
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
