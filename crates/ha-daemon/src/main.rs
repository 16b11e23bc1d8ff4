//! ha-agent daemon — authenticated HTTP bridge in front of a home-automation
//! controller, typically published through a tunnel subprocess.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ha_bridge::http_api::{api_router_with_auth, ApiState};
use ha_core::config::{AgentConfig, Credentials};
use ha_core::target::UpstreamTarget;
use ha_upstream::HaClient;
use tracing::{error, info, warn};

mod tunnel;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    // Optional .env for local development; real deployments set the
    // environment directly.
    dotenv::dotenv().ok();

    ha_telemetry::logging::init_logging("ha-daemon", "info");
    info!(version = env!("CARGO_PKG_VERSION"), "ha-agent daemon starting");

    let config = AgentConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        AgentConfig::default()
    });

    // Credentials are snapshotted once; nothing re-reads the environment
    // after this point.
    let creds = Credentials::from_env();

    let target = UpstreamTarget::resolve(&creds);
    match &target {
        Some(t) => info!(source = %t.source, base_url = %t.base_url, "upstream target resolved"),
        None => warn!(
            "no upstream token configured -- forwarding endpoints will fail \
             until SUPERVISOR_TOKEN or HA_TOKEN is set"
        ),
    }
    if creds.api_key.is_none() {
        warn!("HA_AGENT_API_KEY not set -- inbound authentication disabled, accepting all requests");
    }

    let client = HaClient::new(target, Duration::from_secs(config.upstream.timeout_secs))
        .context("failed to build upstream client")?;
    let state = Arc::new(ApiState::new(client));
    let router = api_router_with_auth(state, creds.api_key.clone());

    tunnel::spawn(&config.tunnel);

    let port = port_override().unwrap_or(config.agent.port);
    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, "agent API listening");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "API server error");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("ctrl-c received, shutting down");
    server.abort();

    Ok(())
}

/// `HA_AGENT_PORT` beats the config file, matching the credential env vars.
fn port_override() -> Option<u16> {
    std::env::var("HA_AGENT_PORT").ok()?.parse().ok()
}
