//! Candle aggregation state machine.
//!
//! The base timeframe folds raw ticks. Derived timeframes fold only sealed
//! base candles, so a derived candle never sees a price its base candle has
//! not committed. Both seal on the tick that crosses their bucket boundary.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, trace};

use super::history::CandleHistory;
use crate::application::event::MarketEvent;
use crate::domain::{Candle, InstrumentId, PriceTick, Timeframe};

/// Fold state for one (instrument, timeframe).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CandleState {
    /// No tick seen yet.
    #[default]
    Idle,
    /// A candle is accumulating.
    Open { candle: Candle },
}

impl CandleState {
    /// The accumulating candle, if any.
    #[must_use]
    pub fn candle(&self) -> Option<&Candle> {
        match self {
            CandleState::Idle => None,
            CandleState::Open { candle } => Some(candle),
        }
    }
}

/// Candle aggregation for one instrument.
#[derive(Debug)]
pub struct CandleAggregator {
    instrument: InstrumentId,
    base: (Timeframe, CandleState),
    derived: Vec<(Timeframe, CandleState)>,
}

impl CandleAggregator {
    /// Create an idle aggregator. Derived timeframes equal to the base are
    /// ignored.
    #[must_use]
    pub fn new(instrument: InstrumentId, base: Timeframe, derived: &[Timeframe]) -> Self {
        let mut derived: Vec<Timeframe> = derived.iter().copied().filter(|tf| *tf != base).collect();
        derived.sort();
        derived.dedup();
        Self {
            instrument,
            base: (base, CandleState::Idle),
            derived: derived
                .into_iter()
                .map(|tf| (tf, CandleState::Idle))
                .collect(),
        }
    }

    #[must_use]
    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    /// State for a timeframe, if it is aggregated here.
    #[must_use]
    pub fn state(&self, timeframe: Timeframe) -> Option<&CandleState> {
        std::iter::once(&self.base)
            .chain(self.derived.iter())
            .find(|(tf, _)| *tf == timeframe)
            .map(|(_, state)| state)
    }

    /// Fold one tick and return the resulting events in publish order.
    ///
    /// On a base boundary crossing the order is: base `CandleClosed`, then
    /// derived events, then `CandleUpdated` for the new base candle. A
    /// derived candle whose bucket the tick has left is sealed in the same
    /// call.
    pub fn on_tick(&mut self, tick: &PriceTick) -> Vec<MarketEvent> {
        let mut events = Vec::new();
        let (timeframe, state) = &mut self.base;

        match state {
            CandleState::Idle => {
                let candle =
                    Candle::open_at(self.instrument.clone(), *timeframe, tick.price, tick.timestamp);
                events.push(MarketEvent::CandleUpdated(candle.clone()));
                *state = CandleState::Open { candle };
            }
            CandleState::Open { candle } if candle.is_crossed_by(tick.timestamp) => {
                let sealed = std::mem::replace(
                    candle,
                    Candle::open_at(self.instrument.clone(), *timeframe, tick.price, tick.timestamp),
                );
                let fresh = candle.clone();
                trace!(
                    instrument = %self.instrument,
                    timeframe = %sealed.timeframe,
                    start = %sealed.start_time,
                    "Base candle sealed"
                );
                events.push(MarketEvent::CandleClosed(sealed.clone()));
                Self::fold_sealed(&mut self.derived, &sealed, tick.timestamp, &mut events);
                events.push(MarketEvent::CandleUpdated(fresh));
            }
            CandleState::Open { candle } => {
                candle.apply_price(tick.price);
                events.push(MarketEvent::CandleUpdated(candle.clone()));
            }
        }

        events
    }

    fn fold_sealed(
        derived: &mut [(Timeframe, CandleState)],
        sealed: &Candle,
        now: DateTime<Utc>,
        events: &mut Vec<MarketEvent>,
    ) {
        for (timeframe, state) in derived.iter_mut() {
            let candle = match std::mem::take(state) {
                CandleState::Idle => Candle::derive_from(*timeframe, sealed),
                CandleState::Open { candle } if candle.is_crossed_by(sealed.start_time) => {
                    events.push(MarketEvent::CandleClosed(candle));
                    Candle::derive_from(*timeframe, sealed)
                }
                CandleState::Open { mut candle } => {
                    candle.absorb(sealed);
                    candle
                }
            };

            if candle.is_crossed_by(now) {
                trace!(
                    instrument = %candle.instrument,
                    timeframe = %candle.timeframe,
                    start = %candle.start_time,
                    "Derived candle sealed"
                );
                events.push(MarketEvent::CandleClosed(candle));
            } else {
                events.push(MarketEvent::CandleUpdated(candle.clone()));
                *state = CandleState::Open { candle };
            }
        }
    }

    /// Consume ticks until shutdown or the tick channel closes.
    ///
    /// Every event is recorded in `history` before it is published.
    /// Pending ticks are dropped on shutdown.
    pub async fn run(
        mut self,
        mut ticks: mpsc::UnboundedReceiver<PriceTick>,
        market_tx: broadcast::Sender<MarketEvent>,
        history: Arc<CandleHistory>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                tick = ticks.recv() => {
                    let Some(tick) = tick else {
                        break;
                    };
                    for event in self.on_tick(&tick) {
                        history.record(&event);
                        let _ = market_tx.send(event);
                    }
                }
            }
        }
        debug!(instrument = %self.instrument, "Candle aggregator stopped");
    }
}
