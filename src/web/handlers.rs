use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::models::StationQuery;
use crate::mta::engine::QueryError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ArrivalParams {
    station: Option<String>,
    inbound: Option<bool>,
    outbound: Option<bool>,
    /// Comma-separated route ids, e.g. `B,D`.
    routes: Option<String>,
}

/// GET /api/arrivals?station=B19&inbound=true&outbound=false&routes=B,D
pub async fn get_arrivals(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ArrivalParams>,
) -> impl IntoResponse {
    let station = match params.station.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": "Missing 'station' parameter" })),
            );
        }
    };

    let query = StationQuery::new(station)
        .with_directions(params.inbound.unwrap_or(true), params.outbound.unwrap_or(true))
        .with_routes(parse_route_filter(params.routes.as_deref().unwrap_or("")));

    match state.service.query(&query).await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "station": query.station_id,
                "arrivals": report.arrivals,
                "decode_failures": report.decode_failures,
                "failed_endpoints": report.failed_endpoints,
            })),
        ),
        Err(e) => {
            warn!("[WEB] Arrivals query failed: {}", e);
            (
                status_for(&e),
                Json(json!({ "success": false, "error": e.to_string() })),
            )
        }
    }
}

/// GET /api/stops/{stop_id}/name: display name of a parent station.
pub async fn get_stop_name(
    State(state): State<Arc<AppState>>,
    Path(stop_id): Path<String>,
) -> impl IntoResponse {
    match state.service.stop_name(&stop_id) {
        Some(name) => (
            StatusCode::OK,
            Json(json!({ "success": true, "stop_id": stop_id, "stop_name": name })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "error": format!("Station '{}' not found in database", stop_id),
            })),
        ),
    }
}

/// GET /api/healthz: liveness plus the loaded tables.
pub async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let routes: Vec<&str> = state.service.feeds().routes().collect();
    Json(json!({
        "ok": true,
        "routes": routes,
        "stations": state.service.directory().len(),
    }))
}

// -- Helper functions --

/// Split a comma-separated route list, dropping blanks.
fn parse_route_filter(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

fn status_for(err: &QueryError) -> StatusCode {
    match err {
        QueryError::UnknownStation(_) => StatusCode::NOT_FOUND,
        QueryError::Fetch(_) => StatusCode::BAD_GATEWAY,
    }
}
