//! Builders for domain primitives used across tests.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    AccountId, Direction, Instrument, InstrumentId, InstrumentRegistry, MarketCalendar, PriceModel,
    Trade, TradeId, TradeStatus, UserId,
};

/// BTCUSD priced between 10 000 and 100 000, starting at 50 000.
pub fn btc(calendar: MarketCalendar) -> Instrument {
    instrument("BTCUSD", 50_000.0, 10_000.0, 100_000.0, calendar)
}

/// An instrument with 1% volatility and two decimal places.
pub fn instrument(
    id: &str,
    initial_price: f64,
    min_price: f64,
    max_price: f64,
    calendar: MarketCalendar,
) -> Instrument {
    let (base, quote) = id.split_at(id.len().saturating_sub(3));
    Instrument::new(
        InstrumentId::from(id),
        base,
        quote,
        2,
        PriceModel {
            initial_price,
            min_price,
            max_price,
            volatility: 0.01,
        },
        calendar,
    )
}

/// Registry of always-open instruments with the given payouts.
pub fn registry(entries: &[(&str, u32)]) -> InstrumentRegistry {
    InstrumentRegistry::new(
        entries
            .iter()
            .map(|(id, payout)| {
                (
                    instrument(id, 100.0, 1.0, 1_000.0, MarketCalendar::always_open()),
                    Some(*payout),
                )
            })
            .collect(),
    )
}

/// A calendar closed on weekends with no holidays or maintenance.
pub fn weekday_calendar() -> MarketCalendar {
    MarketCalendar::default()
}

/// An open BTCUSD CALL for 100 at 50 000 with a 0.8 payout.
pub fn open_trade(id: &str, user: &str, opened_at: DateTime<Utc>, expires_in_secs: i64) -> Trade {
    Trade {
        id: TradeId::from(id),
        user_id: UserId::from(user),
        account_id: AccountId::new(format!("acc-{user}")),
        direction: Direction::Call,
        instrument: InstrumentId::from("BTCUSD"),
        amount: Decimal::ONE_HUNDRED,
        entry_price: 50_000.0,
        exit_price: None,
        payout: Decimal::new(8, 1),
        status: TradeStatus::Open,
        opened_at,
        expires_at: opened_at + Duration::seconds(expires_in_secs),
        closed_at: None,
    }
}
