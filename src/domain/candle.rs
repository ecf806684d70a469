//! OHLC candle type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::InstrumentId;
use super::timeframe::Timeframe;

/// OHLC summary of ticks over one timeframe bucket.
///
/// `start_time` is inclusive, `end_time` exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub instrument: InstrumentId,
    pub timeframe: Timeframe,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Number of base ticks (or base candles, for derived timeframes) folded in.
    pub tick_count: u32,
}

impl Candle {
    /// Open a flat candle at `price` for the bucket containing `ts`.
    #[must_use]
    pub fn open_at(
        instrument: InstrumentId,
        timeframe: Timeframe,
        price: f64,
        ts: DateTime<Utc>,
    ) -> Self {
        let start_time = timeframe.bucket_start(ts);
        Self {
            instrument,
            timeframe,
            open: price,
            high: price,
            low: price,
            close: price,
            start_time,
            end_time: timeframe.bucket_end(start_time),
            tick_count: 1,
        }
    }

    /// Fold a tick price into the candle. `open` never changes.
    pub fn apply_price(&mut self, price: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.tick_count += 1;
    }

    /// Open a derived-timeframe candle from its first sealed constituent.
    #[must_use]
    pub fn derive_from(timeframe: Timeframe, constituent: &Candle) -> Self {
        let start_time = timeframe.bucket_start(constituent.start_time);
        Self {
            instrument: constituent.instrument.clone(),
            timeframe,
            open: constituent.open,
            high: constituent.high,
            low: constituent.low,
            close: constituent.close,
            start_time,
            end_time: timeframe.bucket_end(start_time),
            tick_count: 1,
        }
    }

    /// Fold a later sealed constituent into a derived candle.
    pub fn absorb(&mut self, constituent: &Candle) {
        self.high = self.high.max(constituent.high);
        self.low = self.low.min(constituent.low);
        self.close = constituent.close;
        self.tick_count += 1;
    }

    /// True when `ts` belongs to a later bucket than this candle.
    #[must_use]
    pub fn is_crossed_by(&self, ts: DateTime<Utc>) -> bool {
        self.timeframe.bucket_start(ts) > self.start_time
    }

    /// `low <= open, close <= high`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.low <= self.open
            && self.low <= self.close
            && self.open <= self.high
            && self.close <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn open_at_aligns_to_bucket() {
        let tf: Timeframe = "5s".parse().unwrap();
        let candle = Candle::open_at(InstrumentId::from("BTCUSD"), tf, 100.0, ts(12_345));
        assert_eq!(candle.start_time, ts(10_000));
        assert_eq!(candle.end_time, ts(15_000));
        assert_eq!(candle.open, 100.0);
        assert!(candle.is_consistent());
    }

    #[test]
    fn apply_price_tracks_extremes() {
        let tf: Timeframe = "5s".parse().unwrap();
        let mut candle = Candle::open_at(InstrumentId::from("BTCUSD"), tf, 100.0, ts(0));
        candle.apply_price(105.0);
        candle.apply_price(95.0);
        candle.apply_price(101.0);

        assert_eq!(candle.open, 100.0);
        assert_eq!(candle.high, 105.0);
        assert_eq!(candle.low, 95.0);
        assert_eq!(candle.close, 101.0);
        assert_eq!(candle.tick_count, 4);
        assert!(candle.is_consistent());
    }

    #[test]
    fn derived_candle_spans_constituents() {
        let base: Timeframe = "5s".parse().unwrap();
        let minute: Timeframe = "1m".parse().unwrap();
        let id = InstrumentId::from("BTCUSD");

        let mut first = Candle::open_at(id.clone(), base, 100.0, ts(60_000));
        first.apply_price(104.0);
        first.apply_price(102.0);
        let mut second = Candle::open_at(id, base, 102.0, ts(65_000));
        second.apply_price(97.0);
        second.apply_price(99.0);

        let mut derived = Candle::derive_from(minute, &first);
        derived.absorb(&second);

        assert_eq!(derived.start_time, ts(60_000));
        assert_eq!(derived.end_time, ts(120_000));
        assert_eq!(derived.open, 100.0);
        assert_eq!(derived.high, 104.0);
        assert_eq!(derived.low, 97.0);
        assert_eq!(derived.close, 99.0);
        assert_eq!(derived.tick_count, 2);
    }

    #[test]
    fn crossing_detection() {
        let tf: Timeframe = "5s".parse().unwrap();
        let candle = Candle::open_at(InstrumentId::from("BTCUSD"), tf, 100.0, ts(1_000));
        assert!(!candle.is_crossed_by(ts(4_999)));
        assert!(candle.is_crossed_by(ts(5_000)));
    }
}
