// ---------------------------------------------------------------------------
// HTTP API module directory
// ---------------------------------------------------------------------------
//
// One file per route family; this file wires them together and owns the
// Axum router. Handlers translate exactly one inbound request into at most
// one upstream call and shape the JSON that goes back out.

mod misc;
mod passthrough;
mod services;
pub mod state;
mod states;
pub mod types;

pub use state::ApiState;
pub use types::*;

use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::AuthLayer;
use ha_telemetry::tracing_setup::request_id_middleware;

/// Build the full API router without authentication (open mode).
pub fn api_router(state: Arc<ApiState>) -> Router {
    api_router_with_auth(state, None)
}

/// Build the API router with optional authentication.
///
/// When `api_key` is `Some`, the [`AuthLayer`] middleware requires every
/// request except `GET /health` to carry a valid key. When `None`, all
/// requests pass through.
pub fn api_router_with_auth(state: Arc<ApiState>, api_key: Option<String>) -> Router {
    Router::new()
        .route("/health", get(misc::health))
        .route("/states", get(states::list_states))
        .route("/states/{entity_id}", get(states::get_state))
        .route("/config", get(states::get_config))
        .route("/call-service", post(services::call_service))
        .route("/toggle", post(services::toggle))
        .route("/turn-on", post(services::turn_on))
        .route("/turn-off", post(services::turn_off))
        .route(
            "/api/{*rest}",
            get(passthrough::passthrough_get).post(passthrough::passthrough_post),
        )
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(AuthLayer::new(api_key))
        // Outermost so OPTIONS preflights short-circuit before auth.
        .layer(cors_layer())
        .with_state(state)
}

/// Any origin, the agent's method set, any headers. The agent is meant to
/// be called from browsers behind the tunnel.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}
