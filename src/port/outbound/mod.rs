//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the persistence collaborators the core depends
//! on without naming a storage technology.

mod ledger;
mod price;
mod trade;

pub use ledger::Ledger;
pub use price::PriceStore;
pub use trade::TradeStore;
