//! Price engine lifecycle.

pub mod manager;

pub use manager::{EngineManager, EngineSettings};
