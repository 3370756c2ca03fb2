//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx style line, extended with the cache outcome)
//! - `common` (Common Log Format - CLF)
//! - `json` (JSON structured logging)
//! - Custom patterns with variables

use chrono::Local;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// How the content cache took part in answering a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    /// Request never consulted the cache
    Bypass,
}

impl CacheOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "-",
        }
    }
}

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client address
    pub remote_addr: String,
    /// Request timestamp
    pub time: chrono::DateTime<Local>,
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request target as sent by the client
    pub path: String,
    /// Protocol token from the request line, e.g. `HTTP/1.1`
    pub protocol: String,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: usize,
    pub cache: CacheOutcome,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, path: String, protocol: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            protocol,
            status: 200,
            body_bytes: 0,
            cache: CacheOutcome::Bypass,
            request_time_us: 0,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} {}", self.method, self.path, self.protocol)
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent $cache $request_time`
    fn format_combined(&self) -> String {
        format!(
            "{} {} {}",
            self.format_common(),
            self.cache.as_str(),
            self.request_time_secs(),
        )
    }

    /// Common Log Format (CLF)
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    /// JSON structured log format
    fn format_json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "protocol": self.protocol,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "cache": self.cache.as_str(),
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Expand `$variable` references in a user supplied pattern
    ///
    /// Supported variables:
    /// - `$remote_addr` - Client address
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$request` - Full request line
    /// - `$request_method` - HTTP method
    /// - `$request_uri` - Request target
    /// - `$server_protocol` - Protocol token
    /// - `$status` - Response status code
    /// - `$body_bytes_sent` - Response body size
    /// - `$cache_status` - `HIT`, `MISS` or `-`
    /// - `$request_time` - Request processing time in seconds (3 decimal places)
    ///
    /// Unknown names are copied through unchanged.
    fn format_custom(&self, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() + 64);
        let mut rest = pattern;

        while let Some(dollar) = rest.find('$') {
            out.push_str(&rest[..dollar]);
            let after = &rest[dollar + 1..];
            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..name_len];

            match self.variable(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[name_len..];
        }
        out.push_str(rest);
        out
    }

    fn variable(&self, name: &str) -> Option<String> {
        let value = match name {
            "remote_addr" => self.remote_addr.clone(),
            "time_local" => self.time.format(CLF_TIME).to_string(),
            "time_iso8601" => self.time.to_rfc3339(),
            "request" => self.request_line(),
            "request_method" => self.method.clone(),
            "request_uri" => self.path.clone(),
            "server_protocol" => self.protocol.clone(),
            "status" => self.status.to_string(),
            "body_bytes_sent" => self.body_bytes.to_string(),
            "cache_status" => self.cache.as_str().to_string(),
            "request_time" => self.request_time_secs(),
            _ => return None,
        };
        Some(value)
    }

    fn request_time_secs(&self) -> String {
        #[allow(clippy::cast_precision_loss)]
        let secs = self.request_time_us as f64 / 1_000_000.0;
        format!("{secs:.3}")
    }
}
