//! Request line parsing
//!
//! Only the first line of the request is interpreted. Headers and body are
//! read off the socket with it but never parsed.

use crate::error::ServerError;

/// The three tokens of an HTTP request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub protocol: String,
}

impl RequestLine {
    /// Parse the first line of a raw request
    ///
    /// Tokens are separated by any ASCII whitespace. Lines may end in `\r\n`,
    /// `\n` or `\r`. Fewer than three tokens, or a first line that is not
    /// UTF-8, is a `MalformedRequest`.
    pub fn parse(raw: &[u8]) -> Result<Self, ServerError> {
        let end = raw
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .unwrap_or(raw.len());
        let line = std::str::from_utf8(&raw[..end])
            .map_err(|_| ServerError::MalformedRequest("request line is not UTF-8".to_string()))?;

        let mut tokens = line.split_ascii_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(method), Some(target), Some(protocol)) => Ok(Self {
                method: method.to_string(),
                target: target.to_string(),
                protocol: protocol.to_string(),
            }),
            _ => Err(ServerError::MalformedRequest(truncate(line, 80))),
        }
    }

    /// Target without any query string or fragment
    pub fn path(&self) -> &str {
        self.target
            .split(['?', '#'])
            .next()
            .unwrap_or(&self.target)
    }
}

fn truncate(line: &str, max_chars: usize) -> String {
    line.chars().take(max_chars).collect()
}
