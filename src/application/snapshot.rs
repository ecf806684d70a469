//! Read-side snapshot for one user, instrument and timeframe.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::engine::EngineManager;
use crate::application::market::MarketStatusResolver;
use crate::application::trade::TradeService;
use crate::domain::{Candle, InstrumentId, MarketStatus, Timeframe, Trade, UserId};
use crate::error::{Result, TradeError};
use crate::port::Clock;

/// An open trade with its live countdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenTradeView {
    #[serde(flatten)]
    pub trade: Trade,
    pub remaining_secs: u64,
}

/// Everything an observer needs to render one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub instrument: InstrumentId,
    pub timeframe: Timeframe,
    /// `None` while the market is closed.
    pub current_price: Option<f64>,
    /// Sealed candles oldest first, followed by the open candle if any.
    pub candles: Vec<Candle>,
    pub open_trades: Vec<OpenTradeView>,
    pub server_time: DateTime<Utc>,
    pub market: MarketStatus,
}

/// Combines engine, market status and trade state into snapshots.
pub struct SnapshotService {
    engine: Arc<EngineManager>,
    resolver: Arc<MarketStatusResolver>,
    trades: Arc<TradeService>,
    clock: Arc<dyn Clock>,
}

impl SnapshotService {
    pub fn new(
        engine: Arc<EngineManager>,
        resolver: Arc<MarketStatusResolver>,
        trades: Arc<TradeService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            resolver,
            trades,
            clock,
        }
    }

    /// Build a snapshot. Market status and alternatives are recomputed on
    /// every call.
    pub async fn snapshot(
        &self,
        user: &UserId,
        instrument: &InstrumentId,
        timeframe: Timeframe,
    ) -> Result<Snapshot> {
        let now = self.clock.now();
        let market = self.resolver.status_at(instrument, now)?;

        let mut candles = self.engine.candles(instrument, timeframe);
        if let Some(open) = self.engine.open_candle(instrument, timeframe) {
            candles.push(open);
        }

        let open_trades = self
            .trades
            .open_trades_for(user)
            .await?
            .into_iter()
            .map(|trade| OpenTradeView {
                remaining_secs: trade.remaining_secs(now),
                trade,
            })
            .collect();

        Ok(Snapshot {
            instrument: instrument.clone(),
            timeframe,
            current_price: if market.is_open() {
                self.engine.current_price(instrument)
            } else {
                None
            },
            candles,
            open_trades,
            server_time: now,
            market,
        })
    }

    /// Latest price for an instrument.
    pub fn current_price(&self, instrument: &InstrumentId) -> Result<Option<f64>> {
        if !self.engine.instrument_ids().contains(instrument) {
            return Err(TradeError::UnknownInstrument(instrument.to_string()).into());
        }
        Ok(self.engine.current_price(instrument))
    }
}
