//! Market status resolution.
//!
//! [`resolve`] and [`next_open_at`] are pure functions of an instant and a
//! calendar, so any layer computing a countdown from the same inputs gets
//! the same answer. [`MarketStatusResolver`] adds the live clock, message
//! text and the payout-ranked alternatives.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};

use crate::domain::{
    Alternative, Countdown, InstrumentId, InstrumentRegistry, MarketCalendar, MarketState,
    MarketStatus,
};
use crate::error::TradeError;
use crate::port::Clock;

/// Closure boundaries walked before giving up on finding the next open.
const MAX_BOUNDARY_STEPS: usize = 64;

/// Default number of alternatives offered.
pub const DEFAULT_ALTERNATIVES: usize = 3;

/// State of a market at `now`.
///
/// Precedence: maintenance, holiday, weekend, open.
#[must_use]
pub fn resolve(now: DateTime<Utc>, calendar: &MarketCalendar) -> MarketState {
    if calendar.maintenance.iter().any(|w| w.contains(now)) {
        MarketState::Maintenance
    } else if calendar.holidays.contains(&now.date_naive()) {
        MarketState::Holiday
    } else if !calendar.trades_weekends && is_weekend(now) {
        MarketState::Weekend
    } else {
        MarketState::Open
    }
}

/// First open instant at or after `now`.
///
/// Returns `None` when a containing maintenance window has no end or no
/// open instant is found within a bounded number of boundaries.
#[must_use]
pub fn next_open_at(now: DateTime<Utc>, calendar: &MarketCalendar) -> Option<DateTime<Utc>> {
    let mut at = now;
    for _ in 0..MAX_BOUNDARY_STEPS {
        at = match resolve(at, calendar) {
            MarketState::Open => return Some(at),
            MarketState::Maintenance => calendar
                .maintenance
                .iter()
                .filter(|w| w.contains(at))
                .map(|w| w.end)
                .collect::<Option<Vec<_>>>()?
                .into_iter()
                .max()?,
            MarketState::Holiday => midnight(at.date_naive() + Duration::days(1))?,
            MarketState::Weekend => {
                let days = match at.weekday() {
                    Weekday::Sat => 2,
                    _ => 1,
                };
                midnight(at.date_naive() + Duration::days(days))?
            }
        };
    }
    None
}

fn is_weekend(now: DateTime<Utc>) -> bool {
    matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn status_message(
    instrument: &InstrumentId,
    state: MarketState,
    countdown: Option<&Countdown>,
) -> String {
    let reason = match state {
        MarketState::Open => return format!("{instrument} market is open"),
        MarketState::Weekend => "closed for the weekend",
        MarketState::Holiday => "closed for a holiday",
        MarketState::Maintenance => "closed for maintenance",
    };
    match countdown {
        Some(countdown) => format!("{instrument} market is {reason}, opens in {countdown}"),
        None => format!("{instrument} market is {reason}"),
    }
}

/// Live market status with alternatives ranked from the payout registry.
pub struct MarketStatusResolver {
    registry: Arc<InstrumentRegistry>,
    clock: Arc<dyn Clock>,
    alternatives: usize,
}

impl MarketStatusResolver {
    pub fn new(registry: Arc<InstrumentRegistry>, clock: Arc<dyn Clock>, alternatives: usize) -> Self {
        Self {
            registry,
            clock,
            alternatives,
        }
    }

    /// Status at the current clock instant.
    pub fn status(&self, instrument: &InstrumentId) -> Result<MarketStatus, TradeError> {
        self.status_at(instrument, self.clock.now())
    }

    /// Status at an explicit instant.
    pub fn status_at(
        &self,
        instrument: &InstrumentId,
        now: DateTime<Utc>,
    ) -> Result<MarketStatus, TradeError> {
        let calendar = self
            .registry
            .get(instrument)
            .ok_or_else(|| TradeError::UnknownInstrument(instrument.to_string()))?
            .calendar();

        let state = resolve(now, calendar);
        let next_open_at = if state.is_open() {
            None
        } else {
            next_open_at(now, calendar)
        };
        let countdown = next_open_at.map(|at| Countdown::between(now, at));

        Ok(MarketStatus {
            instrument: instrument.clone(),
            state,
            next_open_at,
            message: status_message(instrument, state, countdown.as_ref()),
            countdown,
            alternatives: self.alternatives_at(instrument, now),
        })
    }

    /// Currently open instruments other than `exclude`, best payout first,
    /// ties broken by id.
    #[must_use]
    pub fn alternatives_at(&self, exclude: &InstrumentId, now: DateTime<Utc>) -> Vec<Alternative> {
        let mut open: Vec<Alternative> = self
            .registry
            .instruments()
            .iter()
            .filter(|i| i.id() != exclude && resolve(now, i.calendar()).is_open())
            .filter_map(|i| {
                self.registry.payout_percent(i.id()).map(|payout_percent| Alternative {
                    instrument: i.id().clone(),
                    payout_percent,
                })
            })
            .collect();

        open.sort_by(|a, b| {
            b.payout_percent
                .cmp(&a.payout_percent)
                .then_with(|| a.instrument.cmp(&b.instrument))
        });
        open.truncate(self.alternatives);
        open
    }
}
