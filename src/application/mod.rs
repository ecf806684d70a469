//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the application's use cases.

pub mod broadcast;
pub mod candle;
pub mod engine;
pub mod event;
pub mod market;
pub mod price;
pub mod snapshot;
pub mod trade;
