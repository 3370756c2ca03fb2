use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::Notify;

use cached_webserver::config::{self, Config};
use cached_webserver::error::ServerError;
use cached_webserver::handler::static_files::verify_system_files;
use cached_webserver::handler::RequestPipeline;
use cached_webserver::logger;
use cached_webserver::server::{self, ConnectionSettings};

fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());

    let cfg = match Config::load_from(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[ERROR] Failed to load configuration from '{config_path}': {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger::init(&cfg) {
        eprintln!("[ERROR] Failed to open log files: {e}");
        return ExitCode::FAILURE;
    }

    // Connections are served one at a time, so a single thread is enough
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            logger::log_error(&format!("Failed to start runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(async_main(cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn async_main(cfg: Config) -> Result<(), ServerError> {
    verify_system_files(&cfg.paths).await?;

    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr).map_err(|e| {
        ServerError::Connection(std::io::Error::new(
            e.kind(),
            format!("failed to bind {addr}: {e}"),
        ))
    })?;

    logger::log_server_start(&addr, &cfg);
    logger::log_debug(&format!("Effective configuration:\n{}", cfg.to_toml()));

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    let pipeline = RequestPipeline::new(&cfg);
    server::run(listener, pipeline, ConnectionSettings::from(&cfg), shutdown).await
}
