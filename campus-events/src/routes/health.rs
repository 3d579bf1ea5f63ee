use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use campus_shared::types::api::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Response {
    let database = match state.store.ping() {
        Ok(()) => HealthCheck::healthy("database"),
        Err(e) => HealthCheck::unhealthy("database", e.to_string()),
    };

    let response = HealthResponse::healthy("campus-events", env!("CARGO_PKG_VERSION"))
        .with_checks(vec![database]);

    let status = match response.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (status, Json(response)).into_response()
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
