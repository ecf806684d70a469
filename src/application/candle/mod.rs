//! Tick-to-candle aggregation.
//!
//! - [`aggregator::CandleAggregator`]: per-instrument fold of ticks into base
//!   and derived timeframe candles
//! - [`history::CandleHistory`]: bounded store of sealed candles plus the
//!   currently open candle per (instrument, timeframe)

pub mod aggregator;
pub mod history;

pub use aggregator::{CandleAggregator, CandleState};
pub use history::CandleHistory;
