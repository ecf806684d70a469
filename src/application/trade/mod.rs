//! Trade lifecycle: opening, expiry settlement and countdowns.
//!
//! - [`service::TradeService`]: validation, stake hold and at-most-once settlement
//! - [`countdown::CountdownTracker`]: monotonic remaining-seconds per open trade
//! - [`monitor::TradeMonitor`]: timer loop running settlement sweeps and countdowns

pub mod countdown;
pub mod monitor;
pub mod service;

pub use countdown::CountdownTracker;
pub use monitor::{TradeMonitor, TradeMonitorHandle};
pub use service::{OpenTradeRequest, SettleOutcome, TradeService, TradeSettings};
