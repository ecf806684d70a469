//! Application orchestration.
//!
//! Runtime wiring and lifecycle management.

pub mod orchestrator;
mod runtime;
