use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::AppState;

use super::handlers;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/arrivals", get(handlers::get_arrivals))
        .route("/api/stops/{stop_id}/name", get(handlers::get_stop_name))
        .route("/api/healthz", get(handlers::healthz))
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(65536)) // 64KB max request body
        .with_state(state)
}

/// Run the axum web server on `addr` until shutdown is requested.
///
/// A bind failure cancels the shutdown token and is returned to the caller.
pub async fn run(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state.clone());

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => {
            info!("[WEB] Server listening on http://{}", addr);
            l
        }
        Err(e) => {
            error!("[WEB] Failed to bind {}: {}", addr, e);
            state.shutdown.cancel();
            return Err(e);
        }
    };

    let shutdown = state.shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

    info!("[WEB] Server stopped");
    served
}
