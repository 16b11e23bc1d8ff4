use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::state::ApiState;
use crate::api_error::ApiError;

/// GET /states -- the controller's full entity state list, unmodified.
pub(crate) async fn list_states(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Value>, ApiError> {
    let payload = state.client.get("/api/states").await?;
    Ok(Json(payload.into_value()))
}

/// GET /states/{entity_id} -- one entity's state object.
pub(crate) async fn get_state(
    State(state): State<Arc<ApiState>>,
    Path(entity_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let payload = state
        .client
        .get(&format!("/api/states/{entity_id}"))
        .await?;
    Ok(Json(payload.into_value()))
}

/// GET /config -- the controller's configuration object.
pub(crate) async fn get_config(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Value>, ApiError> {
    let payload = state.client.get("/api/config").await?;
    Ok(Json(payload.into_value()))
}
