//! Price engine configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::application::engine::EngineSettings;
use crate::domain::Timeframe;

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Milliseconds between generated ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Timeframe folded directly from ticks.
    #[serde(default = "default_base_timeframe")]
    pub base_timeframe: Timeframe,
    /// Timeframes folded from sealed base candles; each must be a multiple
    /// of the base.
    #[serde(default = "default_derived_timeframes")]
    pub derived_timeframes: Vec<Timeframe>,
    /// Sealed candles kept per instrument and timeframe.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Capacity of each event bus channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Fixed RNG seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

const fn default_tick_interval_ms() -> u64 {
    500
}

fn default_base_timeframe() -> Timeframe {
    Timeframe::FIVE_SECONDS
}

fn default_derived_timeframes() -> Vec<Timeframe> {
    [60, 300, 900]
        .into_iter()
        .filter_map(Timeframe::from_secs)
        .collect()
}

const fn default_history_limit() -> usize {
    500
}

const fn default_event_capacity() -> usize {
    1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            base_timeframe: default_base_timeframe(),
            derived_timeframes: default_derived_timeframes(),
            history_limit: default_history_limit(),
            event_capacity: default_event_capacity(),
            seed: None,
        }
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            base_timeframe: config.base_timeframe,
            derived_timeframes: config.derived_timeframes.clone(),
            seed: config.seed,
        }
    }
}
