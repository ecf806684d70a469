//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`clock`] - [`ManualClock`], a clock tests advance by hand.
//! - [`domain`] - Builders for instruments, calendars and trades.
//! - [`ports`] - Port implementations that fail on demand.
//! - [`config`] - Canonical TOML configurations.
//! - [`harness`] - A fully wired trade service over in-memory adapters.

pub mod clock;
pub mod config;
pub mod domain;
pub mod harness;
pub mod ports;

pub use clock::ManualClock;
