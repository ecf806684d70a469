//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//!
//! # Example
//!
//! ```no_run
//! use oddsfeed::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::accounts::AccountConfig;
use super::broadcast::BroadcastConfig;
use super::engine::EngineConfig;
use super::instrument::InstrumentConfig;
use super::logging::LoggingConfig;
use super::trading::TradingConfig;
use crate::domain::{MAX_PAYOUT_PERCENT, MIN_PAYOUT_PERCENT};
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. Every section except `instruments` has defaults.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Tick generation and candle aggregation.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Trade validation and settlement.
    #[serde(default)]
    pub trading: TradingConfig,

    /// Observer fan-out.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Simulated instruments. At least one is required.
    #[serde(default)]
    pub instruments: Vec<InstrumentConfig>,

    /// Demo accounts credited at startup.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

fn invalid(field: &'static str, reason: impl Into<String>) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
    .into()
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Check values are within acceptable ranges. Reports the first problem.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if !self.logging.is_known_format() {
            return Err(invalid("format", "must be \"pretty\" or \"json\""));
        }

        self.validate_engine()?;
        self.validate_trading()?;
        self.validate_broadcast()?;
        self.validate_instruments()?;

        for account in &self.accounts {
            if account.user_id.trim().is_empty() {
                return Err(ConfigError::MissingField { field: "user_id" }.into());
            }
            if account.balance < Decimal::ZERO {
                return Err(invalid(
                    "balance",
                    format!("{}: must be 0 or greater", account.user_id),
                ));
            }
        }

        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_engine(&self) -> Result<()> {
        let engine = &self.engine;
        if engine.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms", "must be greater than 0"));
        }
        if engine.history_limit == 0 {
            return Err(invalid("history_limit", "must be greater than 0"));
        }
        if engine.event_capacity == 0 {
            return Err(invalid("event_capacity", "must be greater than 0"));
        }
        if let Some(tf) = engine
            .derived_timeframes
            .iter()
            .find(|tf| !tf.is_multiple_of(engine.base_timeframe))
        {
            return Err(invalid(
                "derived_timeframes",
                format!("{tf} is not a multiple of {}", engine.base_timeframe),
            ));
        }
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_trading(&self) -> Result<()> {
        let trading = &self.trading;
        if trading.expiration_step_secs == 0 {
            return Err(invalid("expiration_step_secs", "must be greater than 0"));
        }
        if trading.min_expiration_secs == 0 {
            return Err(invalid("min_expiration_secs", "must be greater than 0"));
        }
        if trading.max_expiration_secs < trading.min_expiration_secs {
            return Err(invalid(
                "max_expiration_secs",
                "must be >= min_expiration_secs",
            ));
        }
        if trading.min_expiration_secs % trading.expiration_step_secs != 0
            || trading.max_expiration_secs % trading.expiration_step_secs != 0
        {
            return Err(invalid(
                "expiration_step_secs",
                "expiration bounds must be multiples of the step",
            ));
        }
        if trading.countdown_interval_ms == 0 {
            return Err(invalid("countdown_interval_ms", "must be greater than 0"));
        }
        if trading.settlement_attempts == 0 {
            return Err(invalid("settlement_attempts", "must be greater than 0"));
        }
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_broadcast(&self) -> Result<()> {
        if self.broadcast.client_queue == 0 {
            return Err(invalid("client_queue", "must be greater than 0"));
        }
        if self.broadcast.server_time_interval_ms == 0 {
            return Err(invalid("server_time_interval_ms", "must be greater than 0"));
        }
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_instruments(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(ConfigError::MissingField {
                field: "instruments",
            }
            .into());
        }

        let mut seen = HashSet::new();
        for inst in &self.instruments {
            if inst.id.trim().is_empty() {
                return Err(ConfigError::MissingField { field: "id" }.into());
            }
            if !seen.insert(inst.id.as_str()) {
                return Err(invalid("id", format!("duplicate instrument {}", inst.id)));
            }
            if !(inst.min_price > 0.0 && inst.min_price < inst.max_price) {
                return Err(invalid(
                    "min_price",
                    format!("{}: must satisfy 0 < min_price < max_price", inst.id),
                ));
            }
            if !(inst.min_price..=inst.max_price).contains(&inst.initial_price) {
                return Err(invalid(
                    "initial_price",
                    format!("{}: must lie within [min_price, max_price]", inst.id),
                ));
            }
            if !(inst.volatility > 0.0 && inst.volatility < 1.0) {
                return Err(invalid(
                    "volatility",
                    format!("{}: must be between 0 and 1 (exclusive)", inst.id),
                ));
            }
            if let Some(payout) = inst.payout {
                if !(MIN_PAYOUT_PERCENT..=MAX_PAYOUT_PERCENT).contains(&payout) {
                    return Err(invalid(
                        "payout",
                        format!(
                            "{}: must be between {MIN_PAYOUT_PERCENT} and {MAX_PAYOUT_PERCENT}",
                            inst.id
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
