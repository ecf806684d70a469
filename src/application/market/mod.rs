//! Market open/closed resolution.

pub mod resolver;

pub use resolver::{next_open_at, resolve, MarketStatusResolver, DEFAULT_ALTERNATIVES};
