//! Bounded candle history.

use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;

use crate::application::event::MarketEvent;
use crate::domain::{Candle, InstrumentId, Timeframe};

/// Default number of sealed candles kept per (instrument, timeframe).
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

#[derive(Debug, Default)]
struct Series {
    sealed: VecDeque<Candle>,
    open: Option<Candle>,
}

/// Sealed candles (oldest first, bounded) plus the open candle for every
/// (instrument, timeframe) the aggregators have produced.
#[derive(Debug)]
pub struct CandleHistory {
    limit: usize,
    series: RwLock<HashMap<(InstrumentId, Timeframe), Series>>,
}

impl CandleHistory {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            series: RwLock::new(HashMap::new()),
        }
    }

    /// Apply a candle event. Price events are ignored.
    pub fn record(&self, event: &MarketEvent) {
        match event {
            MarketEvent::CandleUpdated(candle) => {
                let mut series = self.series.write();
                let entry = series
                    .entry((candle.instrument.clone(), candle.timeframe))
                    .or_default();
                entry.open = Some(candle.clone());
            }
            MarketEvent::CandleClosed(candle) => {
                let mut series = self.series.write();
                let entry = series
                    .entry((candle.instrument.clone(), candle.timeframe))
                    .or_default();
                if entry
                    .open
                    .as_ref()
                    .is_some_and(|open| open.start_time == candle.start_time)
                {
                    entry.open = None;
                }
                entry.sealed.push_back(candle.clone());
                while entry.sealed.len() > self.limit {
                    entry.sealed.pop_front();
                }
            }
            MarketEvent::PriceUpdated(_) => {}
        }
    }

    /// Sealed candles, oldest first.
    #[must_use]
    pub fn sealed(&self, instrument: &InstrumentId, timeframe: Timeframe) -> Vec<Candle> {
        self.series
            .read()
            .get(&(instrument.clone(), timeframe))
            .map(|s| s.sealed.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The candle currently accumulating, if any.
    #[must_use]
    pub fn open(&self, instrument: &InstrumentId, timeframe: Timeframe) -> Option<Candle> {
        self.series
            .read()
            .get(&(instrument.clone(), timeframe))
            .and_then(|s| s.open.clone())
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for CandleHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
