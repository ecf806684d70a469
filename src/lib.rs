//! Oddsfeed - simulated price feed with real-time settlement of fixed-odds
//! expiry trades.
//!
//! Each configured instrument gets a bounded random-walk price generator
//! feeding a candle aggregator. Users open CALL/PUT trades against the
//! latest price; a timer settles them at expiry through an append-only
//! ledger and streams countdowns. Observers receive price, candle and
//! trade events through a per-client broadcaster.
//!
//! # Modules
//!
//! - [`domain`] - Instruments, prices, candles, trades, ledger entries and market status
//! - [`port`] - Traits for the clock, price store, trade store and ledger
//! - [`adapter`] - In-memory port implementations
//! - [`application`] - Engine, aggregation, market status, trading, broadcast and snapshots
//! - [`infrastructure`] - Configuration, wiring and runtime lifecycle
//! - [`cli`] - Command-line interface
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - Expose [`testkit`] helpers to integration tests
//!
//! # Example
//!
//! ```no_run
//! use oddsfeed::infrastructure::config::settings::Config;
//! use oddsfeed::infrastructure::orchestration::orchestrator::Orchestrator;
//!
//! # async fn run() -> oddsfeed::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! config.init_logging();
//! Orchestrator::run(config).await
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
