//! HTTP API error types.
//!
//! Provides a unified `ApiError` for consistent error responses across the
//! HTTP layer. Every failure becomes a JSON body with an `error` summary
//! and a `message` detail; upstream-side failures (configuration, timeout,
//! network, controller >= 400) are all flattened to HTTP 500 for
//! compatibility with existing callers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ha_upstream::HaError;
use serde_json::json;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur in the HTTP API layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The inbound API key was missing or wrong.
    #[error("missing or invalid API key")]
    Unauthorized,

    /// The request body failed local validation; no upstream call was made.
    #[error("{0}")]
    Validation(String),

    /// The outbound call failed; carries the upstream taxonomy.
    #[error(transparent)]
    Upstream(#[from] HaError),
}

impl ApiError {
    /// Stable summary for the `error` field.
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::Validation(_) => "validation_error",
            ApiError::Upstream(HaError::NotConfigured) => "configuration_error",
            ApiError::Upstream(HaError::Timeout { .. }) => "timeout",
            ApiError::Upstream(HaError::Http(_)) => "network_error",
            ApiError::Upstream(HaError::Api(_)) => "upstream_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ---------------------------------------------------------------------------
// IntoResponse implementation
// ---------------------------------------------------------------------------

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_maps_to_400() {
        let response = ApiError::Validation("missing required field: domain".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["message"], "missing required field: domain");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = body_json(response).await;
        assert_eq!(json["error"], "unauthorized");
    }

    #[tokio::test]
    async fn upstream_failures_flatten_to_500() {
        for (err, kind) in [
            (HaError::NotConfigured, "configuration_error"),
            (HaError::Timeout { secs: 15 }, "timeout"),
            (HaError::Api("Entity not found".into()), "upstream_error"),
        ] {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

            let json = body_json(response).await;
            assert_eq!(json["error"], kind);
            assert!(json["message"].is_string());
        }
    }

    #[tokio::test]
    async fn upstream_message_is_preserved() {
        let response = ApiError::from(HaError::Api("Entity not found".into())).into_response();
        let json = body_json(response).await;
        assert_eq!(json["message"], "Entity not found");
    }
}
