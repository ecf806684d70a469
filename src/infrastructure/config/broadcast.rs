//! Observer fan-out configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::application::broadcast::BroadcastSettings;

/// `[broadcast]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastConfig {
    /// Messages buffered per client before it is dropped from an event type.
    #[serde(default = "default_client_queue")]
    pub client_queue: usize,
    #[serde(default = "default_server_time_interval_ms")]
    pub server_time_interval_ms: u64,
    /// Alternatives offered in a closed market's status.
    #[serde(default = "default_alternatives")]
    pub alternatives: usize,
}

const fn default_client_queue() -> usize {
    256
}

const fn default_server_time_interval_ms() -> u64 {
    1000
}

const fn default_alternatives() -> usize {
    3
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            client_queue: default_client_queue(),
            server_time_interval_ms: default_server_time_interval_ms(),
            alternatives: default_alternatives(),
        }
    }
}

impl From<&BroadcastConfig> for BroadcastSettings {
    fn from(config: &BroadcastConfig) -> Self {
        Self {
            client_queue: config.client_queue,
            server_time_interval: Duration::from_millis(config.server_time_interval_ms),
        }
    }
}
