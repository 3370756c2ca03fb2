//! Connection handling module
//!
//! Serves exactly one request per accepted connection

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::Config;
use crate::error::ServerError;
use crate::handler::RequestPipeline;
use crate::logger::{self, AccessLogEntry};

/// Per-connection limits and logging switches, fixed at startup
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub max_request_size: usize,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub access_log: bool,
    pub access_log_format: String,
}

impl From<&Config> for ConnectionSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_request_size: config.http.max_request_size,
            read_timeout: config.performance.read_timeout(),
            write_timeout: config.performance.write_timeout(),
            access_log: config.logging.access_log,
            access_log_format: config.logging.access_log_format.clone(),
        }
    }
}

/// Serve a single request on `stream`, then close it.
///
/// This function:
/// 1. Reads once, at most `max_request_size` bytes
/// 2. Runs the request through the pipeline
/// 3. Writes the framed response and shuts the write half down
/// 4. Emits an access log line
///
/// An empty read or a malformed request line closes the connection without a
/// response. Any other error is returned to the accept loop.
pub async fn serve_connection<S>(
    mut stream: S,
    peer_addr: SocketAddr,
    pipeline: &mut RequestPipeline,
    settings: &ConnectionSettings,
) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let started = Instant::now();

    let mut buffer = vec![0u8; settings.max_request_size];
    let received = with_timeout(settings.read_timeout, stream.read(&mut buffer)).await?;
    if received == 0 {
        logger::log_debug(&format!("{peer_addr} closed without sending a request"));
        return Ok(());
    }

    let (request, response) = match pipeline.process(&buffer[..received]).await {
        Ok(exchange) => exchange,
        Err(ServerError::MalformedRequest(line)) => {
            logger::log_warning(&format!(
                "Dropping connection from {peer_addr}: malformed request line '{line}'"
            ));
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    with_timeout(settings.write_timeout, async {
        stream.write_all(&response.wire).await?;
        stream.flush().await?;
        stream.shutdown().await
    })
    .await?;

    if settings.access_log {
        let mut entry = AccessLogEntry::new(
            peer_addr.to_string(),
            request.method,
            request.target,
            request.protocol,
        );
        entry.status = response.status.code();
        entry.body_bytes = response.body_length;
        entry.cache = response.cache;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &settings.access_log_format);
    }

    Ok(())
}

/// Await an I/O future, failing with `TimedOut` once `limit` passes
async fn with_timeout<F, T>(limit: Option<Duration>, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no progress after {} seconds", limit.as_secs()),
            )
        })?,
        None => fut.await,
    }
}
