//! In-memory implementations of the persistence ports.
//!
//! Used by the binary (the simulation keeps no durable state) and by tests.

mod ledger;
mod price;
mod trade;

pub use ledger::MemoryLedger;
pub use price::MemoryPriceStore;
pub use trade::MemoryTradeStore;
