use axum::{extract::State, Json};
use std::sync::Arc;

use super::state::ApiState;
use super::types::HealthResponse;

/// GET /health -- liveness plus whether an upstream token is configured.
/// Always unauthenticated.
pub(crate) async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        upstream_configured: state.client.is_configured(),
    })
}
