//! Logging and request-correlation infrastructure for the ha-agent daemon.
//!
//! Built on the `tracing` ecosystem:
//! - **Logging**: human-readable and JSON-formatted output via
//!   `tracing-subscriber`, with `RUST_LOG` filtering
//! - **Middleware**: axum middleware that injects `X-Request-Id` headers
//!   and wraps each request in a span

pub mod logging;
pub mod tracing_setup;
