//! Trade validation and settlement configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::application::trade::TradeSettings;

/// `[trading]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    #[serde(default = "default_min_expiration_secs")]
    pub min_expiration_secs: u64,
    #[serde(default = "default_max_expiration_secs")]
    pub max_expiration_secs: u64,
    /// Expirations must be a multiple of this.
    #[serde(default = "default_expiration_step_secs")]
    pub expiration_step_secs: u64,
    /// Milliseconds between settlement sweeps and countdown emissions.
    #[serde(default = "default_countdown_interval_ms")]
    pub countdown_interval_ms: u64,
    /// Ledger write attempts per settlement.
    #[serde(default = "default_settlement_attempts")]
    pub settlement_attempts: u32,
    /// Initial delay between ledger write attempts (doubles each retry).
    #[serde(default = "default_settlement_backoff_ms")]
    pub settlement_backoff_ms: u64,
}

const fn default_min_expiration_secs() -> u64 {
    5
}

const fn default_max_expiration_secs() -> u64 {
    300
}

const fn default_expiration_step_secs() -> u64 {
    5
}

const fn default_countdown_interval_ms() -> u64 {
    1000
}

const fn default_settlement_attempts() -> u32 {
    3
}

const fn default_settlement_backoff_ms() -> u64 {
    200
}

impl TradingConfig {
    #[must_use]
    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            min_expiration_secs: default_min_expiration_secs(),
            max_expiration_secs: default_max_expiration_secs(),
            expiration_step_secs: default_expiration_step_secs(),
            countdown_interval_ms: default_countdown_interval_ms(),
            settlement_attempts: default_settlement_attempts(),
            settlement_backoff_ms: default_settlement_backoff_ms(),
        }
    }
}

impl From<&TradingConfig> for TradeSettings {
    fn from(config: &TradingConfig) -> Self {
        Self {
            min_expiration_secs: config.min_expiration_secs,
            max_expiration_secs: config.max_expiration_secs,
            expiration_step_secs: config.expiration_step_secs,
            settlement_attempts: config.settlement_attempts,
            settlement_backoff: Duration::from_millis(config.settlement_backoff_ms),
        }
    }
}
