//! Outbound client for the controller's REST API.
//!
//! One inbound request maps to at most one outbound call: no retries, one
//! timeout budget per call, and a fixed classification of whatever comes
//! back. The client is cheap to clone and is shared immutably across all
//! request handlers.

use std::time::Duration;

use ha_core::target::UpstreamTarget;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub use reqwest::Method;

/// Slack added on top of the call budget for the socket-level timeout.
/// The budget decides the outcome; this only stops a leaked connection
/// from hanging forever after the budget race has been lost.
const SOCKET_BACKSTOP_SECS: u64 = 15;

/// Non-JSON upstream error bodies are cut to this many characters before
/// being surfaced to the caller.
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when calling the controller.
#[derive(Debug, Error)]
pub enum HaError {
    /// Neither a supervisor token nor a long-lived token was configured.
    /// Raised before any network attempt.
    #[error("no upstream token configured -- set SUPERVISOR_TOKEN or HA_TOKEN")]
    NotConfigured,

    /// The call budget elapsed before the full response body arrived.
    #[error("upstream call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The controller answered with status >= 400. The string carries the
    /// controller's own `message` field when it provided one.
    #[error("{0}")]
    Api(String),

    /// A transport-level failure: connection refused, DNS, reset.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for upstream operations.
pub type Result<T> = std::result::Result<T, HaError>;

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// A successful upstream response body.
///
/// Most controller endpoints return JSON, but a few return plain text on
/// success; both count as success and are passed through to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Convert into a JSON value for the response body; raw text becomes a
    /// JSON string.
    pub fn into_value(self) -> Value {
        match self {
            Payload::Json(v) => v,
            Payload::Text(t) => Value::String(t),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the controller's REST API.
///
/// Holds the effective upstream target for the process lifetime. A missing
/// target is representable so the daemon can still serve `/health` and
/// report the degraded state instead of refusing to start.
#[derive(Debug, Clone)]
pub struct HaClient {
    http: reqwest::Client,
    target: Option<UpstreamTarget>,
    budget: Duration,
}

impl HaClient {
    /// Build a client with the given target and per-call budget.
    pub fn new(target: Option<UpstreamTarget>, budget: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(budget + Duration::from_secs(SOCKET_BACKSTOP_SECS))
            .build()?;
        Ok(Self {
            http,
            target,
            budget,
        })
    }

    /// Whether an upstream token was resolved at startup.
    pub fn is_configured(&self) -> bool {
        self.target.is_some()
    }

    /// `GET` a controller path.
    pub async fn get(&self, path: &str) -> Result<Payload> {
        self.call(Method::GET, path, None).await
    }

    /// `POST` a controller path with an optional JSON body.
    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<Payload> {
        self.call(Method::POST, path, body).await
    }

    /// Perform one outbound call. `path` must start with `/`.
    ///
    /// The URL is built by plain concatenation: the base URL may carry its
    /// own path component (the supervisor proxy lives under `/core`), which
    /// absolute-path URL resolution would throw away.
    pub async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Payload> {
        let target = self.target.as_ref().ok_or(HaError::NotConfigured)?;
        let url = format!("{}{}", target.base_url, path);
        debug!(%method, %url, "upstream call");

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(&target.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        // The budget covers send through full body read. Whichever side of
        // the race loses is dropped, which cancels the in-flight request.
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };
        let (status, text) = match tokio::time::timeout(self.budget, exchange).await {
            Ok(outcome) => outcome?,
            Err(_) => {
                return Err(HaError::Timeout {
                    secs: self.budget.as_secs(),
                })
            }
        };

        classify(status, text)
    }
}

/// Map an upstream (status, body) pair to the call outcome.
fn classify(status: reqwest::StatusCode, text: String) -> Result<Payload> {
    let parsed: Option<Value> = serde_json::from_str(&text).ok();

    if status.as_u16() < 400 {
        return Ok(match parsed {
            Some(value) => Payload::Json(value),
            None => Payload::Text(text),
        });
    }

    match parsed {
        Some(value) => match value.get("message").and_then(Value::as_str) {
            Some(message) => Err(HaError::Api(message.to_string())),
            None => Err(HaError::Api(format!("HA returned {}", status.as_u16()))),
        },
        None => Err(HaError::Api(format!(
            "HA returned {}: {}",
            status.as_u16(),
            truncate(&text, ERROR_BODY_PREVIEW_CHARS)
        ))),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
