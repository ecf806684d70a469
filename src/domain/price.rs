//! Price observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::InstrumentId;

/// One simulated price observation.
///
/// Ephemeral: each tick supersedes the previous one for its instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub instrument: InstrumentId,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceTick {
    #[must_use]
    pub fn new(instrument: InstrumentId, price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            instrument,
            price,
            timestamp,
        }
    }
}
