//! Candle bucket widths.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Width of a candle bucket in whole seconds.
///
/// Parsed from and rendered as compact labels: `5s`, `1m`, `15m`, `1h`, `1d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    secs: u64,
}

impl Timeframe {
    /// Five-second buckets.
    pub const FIVE_SECONDS: Timeframe = Timeframe { secs: 5 };
    /// One-minute buckets.
    pub const ONE_MINUTE: Timeframe = Timeframe { secs: 60 };

    /// Widest bucket whose millisecond width fits in an `i64`.
    pub const MAX_SECS: u64 = i64::MAX as u64 / 1000;

    /// Create a timeframe from seconds. Returns `None` for zero or anything
    /// above [`Self::MAX_SECS`].
    #[must_use]
    pub fn from_secs(secs: u64) -> Option<Self> {
        (secs > 0 && secs <= Self::MAX_SECS).then_some(Self { secs })
    }

    /// Bucket width in seconds.
    #[must_use]
    pub fn secs(&self) -> u64 {
        self.secs
    }

    /// Bucket width in milliseconds.
    #[must_use]
    pub fn millis(&self) -> i64 {
        self.secs
            .checked_mul(1000)
            .and_then(|ms| i64::try_from(ms).ok())
            .unwrap_or(i64::MAX)
    }

    /// True when `self` is a whole multiple of `base`.
    #[must_use]
    pub fn is_multiple_of(&self, base: Timeframe) -> bool {
        self.secs % base.secs == 0
    }

    /// Start of the bucket containing `ts`: `floor(ts / width) * width`.
    #[must_use]
    pub fn bucket_start(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let width = self.millis();
        let start = ts.timestamp_millis().div_euclid(width) * width;
        Utc.timestamp_millis_opt(start).single().unwrap_or(ts)
    }

    /// End (exclusive) of the bucket starting at `start`.
    #[must_use]
    pub fn bucket_end(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::try_milliseconds(self.millis())
            .and_then(|width| start.checked_add_signed(width))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];
        for (size, suffix) in UNITS {
            if self.secs % size == 0 {
                return write!(f, "{}{}", self.secs / size, suffix);
            }
        }
        write!(f, "{}s", self.secs)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("timeframe '{s}' is missing a unit"))?;
        let (value, unit) = s.split_at(split);
        let value: u64 = value
            .parse()
            .map_err(|_| format!("timeframe '{s}' has no numeric value"))?;
        let multiplier = match unit {
            "s" => 1,
            "m" => 60,
            "h" => 3_600,
            "d" => 86_400,
            other => return Err(format!("unknown timeframe unit '{other}'")),
        };
        let secs = value
            .checked_mul(multiplier)
            .ok_or_else(|| format!("timeframe '{s}' is too large"))?;
        if secs == 0 {
            return Err(format!("timeframe '{s}' must be > 0"));
        }
        Self::from_secs(secs).ok_or_else(|| format!("timeframe '{s}' is too large"))
    }
}

impl TryFrom<String> for Timeframe {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}
