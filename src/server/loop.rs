//! Server loop module
//!
//! Accepts connections and serves them one at a time

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::{serve_connection, ConnectionSettings};
use crate::error::ServerError;
use crate::handler::RequestPipeline;
use crate::logger;

/// Run the accept loop until `shutdown` is notified or a fatal error occurs.
///
/// Each connection is served to completion before the next `accept`, so the
/// pipeline and its cache are only ever touched by one request at a time. A
/// slow client therefore holds up every client queued behind it.
///
/// Errors confined to one connection are logged and the loop continues. A
/// fatal error (the server's own 404 page vanished) ends the loop and is
/// returned to the caller.
#[allow(clippy::ignored_unit_patterns)]
pub async fn run(
    listener: TcpListener,
    mut pipeline: RequestPipeline,
    settings: ConnectionSettings,
    shutdown: Arc<Notify>,
) -> Result<(), ServerError> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        logger::log_connection_accepted(&peer_addr);
                        match serve_connection(stream, peer_addr, &mut pipeline, &settings).await {
                            Ok(()) => {}
                            Err(e) if e.is_fatal() => {
                                logger::log_server_stop(pipeline.cache());
                                return Err(e);
                            }
                            Err(e) => logger::log_connection_error(&peer_addr, &e),
                        }
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = shutdown.notified() => {
                logger::log_server_stop(pipeline.cache());
                return Ok(());
            }
        }
    }
}
