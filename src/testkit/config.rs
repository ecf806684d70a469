//! Canonical test configurations.
//!
//! Single source of truth for TOML used across config, runtime and CLI
//! tests.

/// One BTCUSD instrument and nothing else. `payout` is deliberately the
/// last key so tests can append one.
pub fn minimal_toml() -> String {
    r#"
[[instruments]]
id = "BTCUSD"
base = "BTC"
quote = "USD"
initial_price = 50000.0
min_price = 10000.0
max_price = 100000.0
volatility = 0.001
"#
    .to_string()
}

/// Every section populated, two instruments and one demo account.
pub fn sample_toml() -> String {
    r#"
[logging]
level = "info"
format = "pretty"

[engine]
tick_interval_ms = 500
base_timeframe = "5s"
derived_timeframes = ["1m", "5m", "15m"]
history_limit = 500
event_capacity = 1024

[trading]
min_expiration_secs = 5
max_expiration_secs = 300
expiration_step_secs = 5
countdown_interval_ms = 1000
settlement_attempts = 3
settlement_backoff_ms = 200

[broadcast]
client_queue = 256
server_time_interval_ms = 1000
alternatives = 3

[[instruments]]
id = "BTCUSD"
base = "BTC"
quote = "USD"
digits = 2
initial_price = 50000.0
min_price = 10000.0
max_price = 100000.0
volatility = 0.001
payout = 80
[instruments.calendar]
trades_weekends = true
holidays = []
maintenance = []

[[instruments]]
id = "EURUSD"
base = "EUR"
quote = "USD"
digits = 5
initial_price = 1.08
min_price = 0.9
max_price = 1.3
volatility = 0.0005
payout = 85
[instruments.calendar]
trades_weekends = false
holidays = ["2026-12-25"]

[[accounts]]
user_id = "demo"
balance = 10000
"#
    .to_string()
}

/// A fast-ticking configuration for runtime tests.
pub fn fast_toml() -> String {
    format!(
        "[engine]\ntick_interval_ms = 20\n\n[trading]\ncountdown_interval_ms = 20\nsettlement_backoff_ms = 1\n\n[broadcast]\nserver_time_interval_ms = 50\n\n[[accounts]]\nuser_id = \"demo\"\nbalance = 500\n\n{}",
        minimal_toml()
    )
}
