use std::time::Instant;

use ha_upstream::HaClient;

/// Shared application state for all HTTP handlers.
///
/// Everything in here is immutable after startup. Handlers receive an
/// `Arc<ApiState>` and never need a lock: the upstream client is resolved
/// once per process and the start time only feeds the health endpoint.
pub struct ApiState {
    pub client: HaClient,
    pub start_time: Instant,
}

impl ApiState {
    pub fn new(client: HaClient) -> Self {
        Self {
            client,
            start_time: Instant::now(),
        }
    }
}
