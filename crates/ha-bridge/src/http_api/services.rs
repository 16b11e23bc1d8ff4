use axum::{extract::State, Json};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::state::ApiState;
use super::types::{CallServiceRequest, EntityRequest, ServiceResponse, TurnOnRequest};
use crate::api_error::ApiError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract the domain from an entity id (`light.kitchen` -> `light`).
///
/// An id without a `.`, or with an empty half, never reaches the
/// controller: it is rejected locally as a validation failure.
fn derive_domain(entity_id: &str) -> Result<&str, ApiError> {
    match entity_id.split_once('.') {
        Some((domain, object)) if !domain.is_empty() && !object.is_empty() => Ok(domain),
        _ => Err(ApiError::Validation(format!(
            "entity_id '{entity_id}' is not of the form domain.object"
        ))),
    }
}

fn require(field: Option<String>, name: &str) -> Result<String, ApiError> {
    field
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("missing required field: {name}")))
}

/// One service invocation: POST /api/services/{domain}/{service}.
async fn forward(
    state: &ApiState,
    domain: &str,
    service: &str,
    body: Value,
) -> Result<Json<ServiceResponse>, ApiError> {
    let payload = state
        .client
        .post(&format!("/api/services/{domain}/{service}"), Some(&body))
        .await?;
    Ok(Json(ServiceResponse {
        success: true,
        result: payload.into_value(),
    }))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /call-service -- invoke an arbitrary controller service.
pub(crate) async fn call_service(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CallServiceRequest>,
) -> Result<Json<ServiceResponse>, ApiError> {
    let domain = require(req.domain, "domain")?;
    let service = require(req.service, "service")?;

    let mut body = match req.data {
        Some(Value::Object(map)) => map,
        Some(_) => return Err(ApiError::Validation("data must be a JSON object".into())),
        None => Map::new(),
    };
    if let Some(entity_id) = req.entity_id {
        body.insert("entity_id".to_string(), json!(entity_id));
    }

    forward(&state, &domain, &service, Value::Object(body)).await
}

/// POST /toggle -- toggle an entity, domain derived from its id prefix.
pub(crate) async fn toggle(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<EntityRequest>,
) -> Result<Json<ServiceResponse>, ApiError> {
    let entity_id = require(req.entity_id, "entity_id")?;
    let domain = derive_domain(&entity_id)?.to_string();
    forward(&state, &domain, "toggle", json!({ "entity_id": entity_id })).await
}

/// POST /turn-on -- turn an entity on, forwarding only the brightness
/// fields the caller supplied.
pub(crate) async fn turn_on(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<TurnOnRequest>,
) -> Result<Json<ServiceResponse>, ApiError> {
    let entity_id = require(req.entity_id, "entity_id")?;
    let domain = derive_domain(&entity_id)?.to_string();

    let mut body = Map::new();
    body.insert("entity_id".to_string(), json!(entity_id));
    if let Some(brightness) = req.brightness {
        body.insert("brightness".to_string(), json!(brightness));
    }
    if let Some(brightness_pct) = req.brightness_pct {
        body.insert("brightness_pct".to_string(), json!(brightness_pct));
    }

    forward(&state, &domain, "turn_on", Value::Object(body)).await
}

/// POST /turn-off -- turn an entity off.
pub(crate) async fn turn_off(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<EntityRequest>,
) -> Result<Json<ServiceResponse>, ApiError> {
    let entity_id = require(req.entity_id, "entity_id")?;
    let domain = derive_domain(&entity_id)?.to_string();
    forward(
        &state,
        &domain,
        "turn_off",
        json!({ "entity_id": entity_id }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_from_entity_id() {
        assert_eq!(derive_domain("light.kitchen").unwrap(), "light");
        assert_eq!(derive_domain("binary_sensor.door.front").unwrap(), "binary_sensor");
    }

    #[test]
    fn dotless_or_empty_ids_rejected() {
        for id in ["kitchen", "", ".kitchen", "light.", "."] {
            assert!(
                matches!(derive_domain(id), Err(ApiError::Validation(_))),
                "expected validation error for {id:?}"
            );
        }
    }
}
