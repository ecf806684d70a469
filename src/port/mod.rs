//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the seams where external collaborators plug in: persistence
//! of trades and ledger entries, the last-price cache, and the clock.
//! In-memory adapters in [`crate::adapter`] implement every port.
//!
//! # Available Ports
//!
//! - [`Clock`] - Authoritative time source
//! - [`PriceStore`] - Last-known price per instrument
//! - [`Ledger`] - Account lookup and append-only balance mutations
//! - [`TradeStore`] - Trade persistence and expiry queries

mod clock;
pub mod outbound;

pub use clock::{Clock, SystemClock};
pub use outbound::{Ledger, PriceStore, TradeStore};
