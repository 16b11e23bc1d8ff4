//! Tunnel subprocess launch.
//!
//! The tunnel (e.g. `cloudflared`) is an opaque sibling: the daemon starts
//! it so the agent is reachable from outside, logs its exit if it dies, and
//! otherwise leaves it alone. No restarts, no health checks.

use ha_core::config::TunnelSection;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Spawn the configured tunnel process, if any.
///
/// The child is killed when the daemon exits (`kill_on_drop`), so a
/// crashed daemon does not leave an orphaned tunnel publishing a dead
/// endpoint.
pub fn spawn(config: &TunnelSection) {
    let Some(command) = config.command.clone() else {
        debug!("no tunnel command configured, skipping");
        return;
    };

    match Command::new(&command)
        .args(&config.args)
        .kill_on_drop(true)
        .spawn()
    {
        Ok(mut child) => {
            info!(command = %command, "tunnel process started");
            tokio::spawn(async move {
                match child.wait().await {
                    Ok(status) => warn!(%status, "tunnel process exited"),
                    Err(e) => warn!(error = %e, "failed to wait on tunnel process"),
                }
            });
        }
        Err(e) => warn!(command = %command, error = %e, "failed to start tunnel process"),
    }
}
