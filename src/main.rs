mod config;
mod models;
mod mta;
mod web;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use config::Config;
use mta::client::MtaClient;
use mta::engine::ArrivalService;
use mta::stations::{StaticStationDirectory, StationDirectory};

/// Shared application state handed to every request handler.
pub struct AppState {
    pub service: ArrivalService,
    pub shutdown: CancellationToken,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing (structured logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mta_train_times=info")),
        )
        .init();

    info!("MTA train times starting");

    let config = match load_config() {
        Some(cfg) => cfg,
        None => return ExitCode::FAILURE,
    };

    let addr = match config.bind_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("[CONFIG] {}", e);
            return ExitCode::FAILURE;
        }
    };

    let directory = match &config.stations_file {
        Some(path) => StaticStationDirectory::load(path),
        None => StaticStationDirectory::embedded(),
    };
    let directory = match directory {
        Ok(d) => {
            info!("[MTA] Station directory loaded: {} stations", d.len());
            d
        }
        Err(e) => {
            error!("[MTA] Failed to load station directory: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match MtaClient::new(config.http.user_agent.as_deref(), config.http.timeout()) {
        Ok(c) => c,
        Err(e) => {
            error!("[FETCH] Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "[CONFIG] {} routes, fetch policy {:?}, timeout {:?}",
        config.feed_table.len(),
        config.fetch_policy,
        config.http.timeout()
    );

    let service = ArrivalService::new(
        Arc::new(config.feed_table),
        Arc::new(directory),
        client,
        config.fetch_policy,
    );

    let state = Arc::new(AppState {
        service,
        shutdown: CancellationToken::new(),
    });

    let web_handle = tokio::spawn(web::server::run(state.clone(), addr));

    tokio::select! {
        _ = shutdown_signal() => info!("Shutdown signal received"),
        _ = state.shutdown.cancelled() => warn!("Shutting down after server error"),
    }
    state.shutdown.cancel();

    match web_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("[WEB] Server error: {}", e);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("[WEB] Server task failed: {}", e);
            return ExitCode::FAILURE;
        }
    }

    info!("MTA train times stopped");
    ExitCode::SUCCESS
}

/// Load config.json; a missing file means defaults, an invalid one is fatal.
fn load_config() -> Option<Config> {
    let Some(path) = find_config_path() else {
        info!("[CONFIG] No config.json found, using defaults");
        return Some(Config::default());
    };
    info!("[CONFIG] Config file: {}", path.display());

    match Config::load(&path) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!("[CONFIG] {}", e);
            None
        }
    }
}

fn find_config_path() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("config.json"),
        PathBuf::from("../config.json"),
    ];
    candidates.into_iter().find(|path| path.exists())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
