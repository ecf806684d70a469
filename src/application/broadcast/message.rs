//! Wire messages sent to observers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::event::{MarketEvent, TradeEvent};
use crate::domain::{Candle, InstrumentId, PriceTick, Trade, TradeId};

/// A message delivered to one client.
///
/// Serialized as `{"type": "<event>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OutboundMessage {
    #[serde(rename = "price:update")]
    PriceUpdate(PriceTick),
    #[serde(rename = "candle:update")]
    CandleUpdate(Candle),
    #[serde(rename = "candle:close")]
    CandleClose(Candle),
    #[serde(rename = "trade:open")]
    TradeOpen(Trade),
    /// Carries the terminal trade with its result.
    #[serde(rename = "trade:close")]
    TradeClose(Trade),
    #[serde(rename = "trade:countdown")]
    TradeCountdown {
        trade_id: TradeId,
        instrument: InstrumentId,
        seconds: u64,
    },
    #[serde(rename = "server:time")]
    ServerTime { timestamp: DateTime<Utc> },
}

impl OutboundMessage {
    /// Wire name of the message type.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::PriceUpdate(_) => "price:update",
            OutboundMessage::CandleUpdate(_) => "candle:update",
            OutboundMessage::CandleClose(_) => "candle:close",
            OutboundMessage::TradeOpen(_) => "trade:open",
            OutboundMessage::TradeClose(_) => "trade:close",
            OutboundMessage::TradeCountdown { .. } => "trade:countdown",
            OutboundMessage::ServerTime { .. } => "server:time",
        }
    }

    /// Serialize to JSON text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<MarketEvent> for OutboundMessage {
    fn from(event: MarketEvent) -> Self {
        match event {
            MarketEvent::PriceUpdated(tick) => OutboundMessage::PriceUpdate(tick),
            MarketEvent::CandleUpdated(candle) => OutboundMessage::CandleUpdate(candle),
            MarketEvent::CandleClosed(candle) => OutboundMessage::CandleClose(candle),
        }
    }
}

impl From<TradeEvent> for OutboundMessage {
    fn from(event: TradeEvent) -> Self {
        match event {
            TradeEvent::Opened(trade) => OutboundMessage::TradeOpen(trade),
            TradeEvent::Closed(trade) => OutboundMessage::TradeClose(trade),
            TradeEvent::Countdown {
                trade_id,
                instrument,
                seconds,
                ..
            } => OutboundMessage::TradeCountdown {
                trade_id,
                instrument,
                seconds,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;

    #[test]
    fn tagged_wire_format() {
        let tick = PriceTick::new(
            InstrumentId::from("BTCUSD"),
            50_123.45,
            Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap(),
        );
        let json: Value =
            serde_json::from_str(&OutboundMessage::PriceUpdate(tick).to_json().unwrap()).unwrap();

        assert_eq!(json["type"], "price:update");
        assert_eq!(json["data"]["instrument"], "BTCUSD");
        assert_eq!(json["data"]["price"], 50_123.45);
    }

    #[test]
    fn countdown_drops_user_id() {
        let msg = OutboundMessage::from(TradeEvent::Countdown {
            trade_id: TradeId::from("t-1"),
            user_id: crate::domain::UserId::from("alice"),
            instrument: InstrumentId::from("BTCUSD"),
            seconds: 12,
        });
        assert_eq!(msg.kind(), "trade:countdown");

        let json: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["data"]["seconds"], 12);
        assert!(json["data"].get("user_id").is_none());
    }

    #[test]
    fn server_time_round_trips() {
        let msg = OutboundMessage::ServerTime {
            timestamp: Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap(),
        };
        let back: OutboundMessage = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(back, msg);
    }
}
