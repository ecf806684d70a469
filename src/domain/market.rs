//! Market calendar and open/closed status types.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::id::InstrumentId;

/// Trading calendar for one instrument.
///
/// All dates and windows are interpreted in UTC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketCalendar {
    /// Trade through Saturday and Sunday (crypto-style) when true.
    #[serde(default)]
    pub trades_weekends: bool,
    /// Full-day closures.
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    /// Scheduled maintenance windows.
    #[serde(default)]
    pub maintenance: Vec<MaintenanceWindow>,
}

impl MarketCalendar {
    /// A calendar that is always open.
    #[must_use]
    pub fn always_open() -> Self {
        Self {
            trades_weekends: true,
            ..Self::default()
        }
    }
}

/// A maintenance closure. An open-ended window has no `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl MaintenanceWindow {
    /// True when `now` falls inside the window.
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.start && self.end.map_or(true, |end| now < end)
    }
}

/// Open/closed state of a market at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketState {
    Open,
    Weekend,
    Maintenance,
    Holiday,
}

impl MarketState {
    /// Returns true if trading is allowed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, MarketState::Open)
    }
}

impl fmt::Display for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MarketState::Open => "OPEN",
            MarketState::Weekend => "WEEKEND",
            MarketState::Maintenance => "MAINTENANCE",
            MarketState::Holiday => "HOLIDAY",
        };
        f.write_str(label)
    }
}

/// Days/hours/minutes/seconds breakdown of a non-negative duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Countdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Countdown {
    /// Break down a number of whole seconds.
    #[must_use]
    pub fn from_secs(total: u64) -> Self {
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }

    /// Countdown from `now` until `target`, clamped at zero.
    #[must_use]
    pub fn between(now: DateTime<Utc>, target: DateTime<Utc>) -> Self {
        let secs = (target - now).num_seconds().max(0) as u64;
        Self::from_secs(secs)
    }

    /// Total seconds represented.
    #[must_use]
    pub fn total_secs(&self) -> u64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
        } else if self.hours > 0 {
            write!(f, "{}h {}m {}s", self.hours, self.minutes, self.seconds)
        } else {
            write!(f, "{}m {}s", self.minutes, self.seconds)
        }
    }
}

/// A tradable alternative offered while a market is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub instrument: InstrumentId,
    pub payout_percent: u32,
}

/// Full market status for one instrument at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStatus {
    pub instrument: InstrumentId,
    pub state: MarketState,
    pub next_open_at: Option<DateTime<Utc>>,
    pub countdown: Option<Countdown>,
    pub message: String,
    pub alternatives: Vec<Alternative>,
}

impl MarketStatus {
    /// Returns true if trading is allowed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn countdown_breaks_down_26_hours() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 10, 0, 0).unwrap();
        let target = now + chrono::Duration::hours(26);
        let countdown = Countdown::between(now, target);
        assert_eq!(
            countdown,
            Countdown {
                days: 1,
                hours: 2,
                minutes: 0,
                seconds: 0
            }
        );
        assert_eq!(countdown.total_secs(), 26 * 3_600);
    }

    #[test]
    fn countdown_never_negative() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 10, 0, 0).unwrap();
        let past = now - chrono::Duration::minutes(5);
        assert_eq!(Countdown::between(now, past), Countdown::default());
    }

    #[test]
    fn countdown_display() {
        assert_eq!(Countdown::from_secs(93_784).to_string(), "1d 2h 3m");
        assert_eq!(Countdown::from_secs(3_725).to_string(), "1h 2m 5s");
        assert_eq!(Countdown::from_secs(65).to_string(), "1m 5s");
    }

    #[test]
    fn open_ended_maintenance_contains_everything_after_start() {
        let start = Utc.with_ymd_and_hms(2026, 10, 17, 10, 0, 0).unwrap();
        let window = MaintenanceWindow { start, end: None };
        assert!(!window.contains(start - chrono::Duration::seconds(1)));
        assert!(window.contains(start));
        assert!(window.contains(start + chrono::Duration::days(365)));
    }

    #[test]
    fn market_state_serializes_upper_case() {
        let json = serde_json::to_string(&MarketState::Weekend).unwrap();
        assert_eq!(json, "\"WEEKEND\"");
    }
}
