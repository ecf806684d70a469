//! Remaining-seconds tracking for open trades.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::application::event::TradeEvent;
use crate::domain::{Trade, TradeId};

/// Last emitted countdown per open trade.
///
/// Values never increase for a trade, even if the clock steps backwards,
/// and trades that leave the open set are forgotten.
#[derive(Debug, Default)]
pub struct CountdownTracker {
    last: HashMap<TradeId, u64>,
}

impl CountdownTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute one countdown event per trade in `open`.
    pub fn tick(&mut self, open: &[Trade], now: DateTime<Utc>) -> Vec<TradeEvent> {
        let live: HashSet<&TradeId> = open.iter().map(|t| &t.id).collect();
        self.last.retain(|id, _| live.contains(id));

        open.iter()
            .map(|trade| {
                let remaining = trade.remaining_secs(now);
                let seconds = match self.last.get(&trade.id) {
                    Some(&previous) => remaining.min(previous),
                    None => remaining,
                };
                self.last.insert(trade.id.clone(), seconds);
                TradeEvent::Countdown {
                    trade_id: trade.id.clone(),
                    user_id: trade.user_id.clone(),
                    instrument: trade.instrument.clone(),
                    seconds,
                }
            })
            .collect()
    }

    /// Number of trades currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.last.len()
    }
}
