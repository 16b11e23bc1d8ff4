use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use ha_upstream::Method;
use serde_json::Value;
use std::sync::Arc;

use super::state::ApiState;
use crate::api_error::ApiError;

/// GET /api/{*rest} -- 1:1 mirror of the controller's native surface, for
/// callers that already speak it.
pub(crate) async fn passthrough_get(
    State(state): State<Arc<ApiState>>,
    Path(rest): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let payload = state
        .client
        .call(Method::GET, &format!("/api/{rest}"), None)
        .await?;
    Ok(Json(payload.into_value()))
}

/// POST /api/{*rest} -- same mirror, forwarding the JSON body untouched.
/// An empty body forwards as no body at all.
pub(crate) async fn passthrough_post(
    State(state): State<Arc<ApiState>>,
    Path(rest): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = if body.is_empty() {
        None
    } else {
        Some(
            serde_json::from_slice::<Value>(&body)
                .map_err(|e| ApiError::Validation(format!("invalid JSON body: {e}")))?,
        )
    };
    let payload = state
        .client
        .call(Method::POST, &format!("/api/{rest}"), body.as_ref())
        .await?;
    Ok(Json(payload.into_value()))
}
