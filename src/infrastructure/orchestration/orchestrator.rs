//! Infrastructure orchestration façade.

pub use super::runtime::{run_with_shutdown, RunningServices};

/// Main application orchestrator.
pub struct Orchestrator;
