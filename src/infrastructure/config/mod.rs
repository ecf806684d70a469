//! Infrastructure configuration modules.

pub mod accounts;
pub mod broadcast;
pub mod engine;
pub mod instrument;
pub mod logging;
pub mod settings;
pub mod trading;
