use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use oddsfeed::application::market::{next_open_at, MarketStatusResolver};
use oddsfeed::domain::{
    Countdown, InstrumentId, InstrumentRegistry, MaintenanceWindow, MarketCalendar, MarketState,
};
use oddsfeed::error::TradeError;
use oddsfeed::testkit::domain::{instrument, weekday_calendar};
use oddsfeed::testkit::ManualClock;

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn resolver(clock: DateTime<Utc>) -> MarketStatusResolver {
    let registry = InstrumentRegistry::new(vec![
        (instrument("EURUSD", 1.1, 0.5, 2.0, weekday_calendar()), Some(85)),
        (instrument("BTCUSD", 100.0, 1.0, 1_000.0, MarketCalendar::always_open()), Some(80)),
        (instrument("ETHUSD", 100.0, 1.0, 1_000.0, MarketCalendar::always_open()), Some(80)),
        (instrument("SOLUSD", 100.0, 1.0, 1_000.0, MarketCalendar::always_open()), Some(70)),
        (instrument("XRPUSD", 100.0, 1.0, 1_000.0, MarketCalendar::always_open()), Some(65)),
    ]);
    MarketStatusResolver::new(Arc::new(registry), Arc::new(ManualClock::new(clock)), 3)
}

#[test]
fn weekend_countdown_to_monday() {
    // Saturday 22:00; Monday 2026-10-19 00:00 is 26 hours away.
    let status = resolver(at(2026, 10, 17, 22))
        .status(&InstrumentId::from("EURUSD"))
        .unwrap();

    assert_eq!(status.state, MarketState::Weekend);
    assert_eq!(status.next_open_at, Some(at(2026, 10, 19, 0)));
    assert_eq!(
        status.countdown,
        Some(Countdown {
            days: 1,
            hours: 2,
            minutes: 0,
            seconds: 0
        })
    );
    assert_eq!(
        status.message,
        "EURUSD market is closed for the weekend, opens in 1d 2h 0m"
    );
}

#[test]
fn closed_market_offers_best_paying_open_alternatives() {
    let status = resolver(at(2026, 10, 17, 22))
        .status(&InstrumentId::from("EURUSD"))
        .unwrap();

    let ranked: Vec<(&str, u32)> = status
        .alternatives
        .iter()
        .map(|a| (a.instrument.as_str(), a.payout_percent))
        .collect();
    assert_eq!(ranked, vec![("BTCUSD", 80), ("ETHUSD", 80), ("SOLUSD", 70)]);
}

#[test]
fn open_market_has_no_countdown() {
    let status = resolver(at(2026, 10, 19, 12))
        .status(&InstrumentId::from("EURUSD"))
        .unwrap();

    assert!(status.is_open());
    assert!(status.next_open_at.is_none());
    assert!(status.countdown.is_none());
    assert_eq!(status.message, "EURUSD market is open");
}

#[test]
fn unknown_instrument_is_rejected() {
    let err = resolver(at(2026, 10, 19, 12))
        .status(&InstrumentId::from("NOPE"))
        .unwrap_err();
    assert_eq!(err, TradeError::UnknownInstrument("NOPE".into()));
}

#[test]
fn holiday_before_weekend_rolls_to_monday() {
    let calendar = MarketCalendar {
        holidays: vec![NaiveDate::from_ymd_opt(2026, 10, 23).unwrap()],
        ..weekday_calendar()
    };
    // Friday holiday, then the weekend.
    assert_eq!(
        next_open_at(at(2026, 10, 23, 9), &calendar),
        Some(at(2026, 10, 26, 0))
    );
}

#[test]
fn maintenance_ending_inside_weekend_waits_for_monday() {
    let calendar = MarketCalendar {
        maintenance: vec![MaintenanceWindow {
            start: at(2026, 10, 16, 20),
            end: Some(at(2026, 10, 17, 6)),
        }],
        ..weekday_calendar()
    };
    assert_eq!(
        next_open_at(at(2026, 10, 16, 22), &calendar),
        Some(at(2026, 10, 19, 0))
    );
}

#[test]
fn open_ended_maintenance_has_no_next_open() {
    let calendar = MarketCalendar {
        maintenance: vec![MaintenanceWindow {
            start: at(2026, 10, 19, 8),
            end: None,
        }],
        ..MarketCalendar::always_open()
    };
    assert_eq!(next_open_at(at(2026, 10, 19, 12), &calendar), None);
}
