//! Exchange-agnostic domain types: instruments, prices, candles, trades,
//! ledger entries and market status.

pub mod candle;
pub mod id;
pub mod instrument;
pub mod ledger;
pub mod market;
pub mod price;
pub mod timeframe;
pub mod trade;

pub use candle::Candle;
pub use id::{AccountId, ClientId, InstrumentId, TradeId, TransactionId, UserId};
pub use instrument::{
    payout_ratio, validate_payout, Instrument, InstrumentRegistry, PriceModel,
    DEFAULT_PAYOUT_PERCENT, MAX_PAYOUT_PERCENT, MIN_PAYOUT_PERCENT,
};
pub use ledger::{confirmed_sum, Account, Transaction, TransactionKind, TransactionStatus};
pub use market::{Alternative, Countdown, MaintenanceWindow, MarketCalendar, MarketState, MarketStatus};
pub use price::PriceTick;
pub use timeframe::Timeframe;
pub use trade::{Direction, Trade, TradeStatus};
