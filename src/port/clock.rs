//! Clock port.
//!
//! Every timestamp in the system (ticks, candle buckets, trade expiry,
//! countdowns) is read through this trait so tests can drive time manually.

use chrono::{DateTime, Utc};

/// Authoritative time source.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
