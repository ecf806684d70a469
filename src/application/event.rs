//! In-process event bus.
//!
//! One `broadcast` channel per instrument carries that instrument's price
//! and candle events, and a single channel carries trade-lifecycle events.
//! Channels are fan-out only: late subscribers see nothing published
//! before they subscribed.

use std::collections::HashMap;

use tokio::sync::broadcast;

use crate::domain::{Candle, InstrumentId, PriceTick, Trade, TradeId, UserId};

/// Price and candle events, all scoped to one instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEvent {
    /// A new tick was generated and stored.
    PriceUpdated(PriceTick),
    /// The open candle for a timeframe changed.
    CandleUpdated(Candle),
    /// A candle crossed its boundary and was sealed.
    CandleClosed(Candle),
}

impl MarketEvent {
    /// Instrument the event belongs to.
    #[must_use]
    pub fn instrument(&self) -> &InstrumentId {
        match self {
            MarketEvent::PriceUpdated(tick) => &tick.instrument,
            MarketEvent::CandleUpdated(candle) | MarketEvent::CandleClosed(candle) => {
                &candle.instrument
            }
        }
    }
}

/// Trade lifecycle events.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeEvent {
    Opened(Trade),
    /// Terminal transition; the trade carries its result.
    Closed(Trade),
    /// Remaining whole seconds for a still-open trade.
    Countdown {
        trade_id: TradeId,
        user_id: UserId,
        instrument: InstrumentId,
        seconds: u64,
    },
}

impl TradeEvent {
    /// User that owns the trade.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        match self {
            TradeEvent::Opened(trade) | TradeEvent::Closed(trade) => &trade.user_id,
            TradeEvent::Countdown { user_id, .. } => user_id,
        }
    }
}

/// Typed fan-out hub shared by generators, aggregators, the settlement
/// engine and the broadcast layer.
#[derive(Debug)]
pub struct EventBus {
    market: HashMap<InstrumentId, broadcast::Sender<MarketEvent>>,
    trades: broadcast::Sender<TradeEvent>,
}

impl EventBus {
    /// Create one market channel per instrument plus the trade channel.
    #[must_use]
    pub fn new(instruments: &[InstrumentId], capacity: usize) -> Self {
        let market = instruments
            .iter()
            .map(|id| (id.clone(), broadcast::channel(capacity).0))
            .collect();
        let (trades, _) = broadcast::channel(capacity);
        Self { market, trades }
    }

    /// Sender for an instrument's market channel.
    #[must_use]
    pub fn market_sender(&self, instrument: &InstrumentId) -> Option<broadcast::Sender<MarketEvent>> {
        self.market.get(instrument).cloned()
    }

    /// Subscribe to one instrument's market events.
    #[must_use]
    pub fn subscribe_market(
        &self,
        instrument: &InstrumentId,
    ) -> Option<broadcast::Receiver<MarketEvent>> {
        self.market.get(instrument).map(broadcast::Sender::subscribe)
    }

    /// Publish a market event. Returns the number of receivers reached.
    pub fn publish_market(&self, event: MarketEvent) -> usize {
        self.market
            .get(event.instrument())
            .and_then(|tx| tx.send(event).ok())
            .unwrap_or(0)
    }

    /// Subscribe to trade lifecycle events.
    #[must_use]
    pub fn subscribe_trades(&self) -> broadcast::Receiver<TradeEvent> {
        self.trades.subscribe()
    }

    /// Publish a trade event. Returns the number of receivers reached.
    pub fn publish_trade(&self, event: TradeEvent) -> usize {
        // No receivers is fine: nobody is watching yet.
        self.trades.send(event).unwrap_or(0)
    }

    /// Instruments with a market channel.
    pub fn instruments(&self) -> impl Iterator<Item = &InstrumentId> {
        self.market.keys()
    }
}
