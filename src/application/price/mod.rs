//! Simulated price feed.
//!
//! - [`generator::PriceGenerator`]: bounded random walk for one instrument

pub mod generator;

pub use generator::{next_price, PriceGenerator};
