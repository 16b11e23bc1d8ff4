use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// GET /health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
    /// Whether an upstream token was resolved at startup. `false` means
    /// every forwarding endpoint will answer with a configuration error.
    pub upstream_configured: bool,
}

/// Envelope for service-invocation responses.
#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub success: bool,
    pub result: Value,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------
//
// Required fields are deserialized as `Option` so that absence is reported
// through the shared error body (400 + validation_error) instead of the
// framework's own rejection format.

/// POST /call-service request.
#[derive(Debug, Deserialize)]
pub struct CallServiceRequest {
    pub domain: Option<String>,
    pub service: Option<String>,
    pub entity_id: Option<String>,
    /// Extra service data forwarded verbatim; must be a JSON object.
    pub data: Option<Value>,
}

/// POST /toggle and POST /turn-off request.
#[derive(Debug, Deserialize)]
pub struct EntityRequest {
    pub entity_id: Option<String>,
}

/// POST /turn-on request. Brightness fields the caller leaves out are
/// omitted from the upstream body, never defaulted.
#[derive(Debug, Deserialize)]
pub struct TurnOnRequest {
    pub entity_id: Option<String>,
    pub brightness: Option<u16>,
    pub brightness_pct: Option<u8>,
}
