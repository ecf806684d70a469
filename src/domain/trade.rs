//! Fixed-odds expiry trades and their outcome rules.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{AccountId, InstrumentId, TradeId, UserId};
use crate::error::TradeError;

/// Predicted price direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Price will be higher at expiry.
    Call,
    /// Price will be lower at expiry.
    Put,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Call => f.write_str("CALL"),
            Direction::Put => f.write_str("PUT"),
        }
    }
}

impl FromStr for Direction {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CALL" => Ok(Direction::Call),
            "PUT" => Ok(Direction::Put),
            _ => Err(TradeError::InvalidDirection(s.to_string())),
        }
    }
}

/// Trade lifecycle state. `Open` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Open,
    Win,
    Loss,
    Tie,
}

impl TradeStatus {
    /// Returns true if the trade is still waiting for expiry.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, TradeStatus::Open)
    }

    /// Outcome of a trade given its entry and exit prices.
    ///
    /// Equal prices are always a tie regardless of direction.
    #[must_use]
    pub fn resolve(direction: Direction, entry_price: f64, exit_price: f64) -> Self {
        if exit_price == entry_price {
            return TradeStatus::Tie;
        }
        let won = match direction {
            Direction::Call => exit_price > entry_price,
            Direction::Put => exit_price < entry_price,
        };
        if won {
            TradeStatus::Win
        } else {
            TradeStatus::Loss
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TradeStatus::Open => "OPEN",
            TradeStatus::Win => "WIN",
            TradeStatus::Loss => "LOSS",
            TradeStatus::Tie => "TIE",
        };
        f.write_str(label)
    }
}

/// A fixed-expiry directional bet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub user_id: UserId,
    pub account_id: AccountId,
    pub direction: Direction,
    pub instrument: InstrumentId,
    pub amount: Decimal,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    /// Profit ratio captured at open time (0.8 for an 80% payout).
    pub payout: Decimal,
    pub status: TradeStatus,
    pub opened_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Trade {
    /// Returns true if the trade has not been settled.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Returns true once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds until expiry, never negative.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.expires_at - now).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            (millis / 1000) as u64
        }
    }

    /// Amount credited back to the account for a terminal outcome.
    ///
    /// The stake is held at open, so a win returns stake plus profit, a tie
    /// returns the stake, and a loss returns nothing.
    #[must_use]
    pub fn credit_for(&self, status: TradeStatus) -> Decimal {
        match status {
            TradeStatus::Win => self.amount + self.amount * self.payout,
            TradeStatus::Tie => self.amount,
            TradeStatus::Loss | TradeStatus::Open => Decimal::ZERO,
        }
    }

    /// Mark the trade terminal. `exit_price` and `closed_at` are write-once:
    /// returns false and leaves the trade untouched if it is already closed.
    pub fn close(&mut self, status: TradeStatus, exit_price: f64, closed_at: DateTime<Utc>) -> bool {
        if !self.is_open() || status.is_open() {
            return false;
        }
        self.status = status;
        self.exit_price = Some(exit_price);
        self.closed_at = Some(closed_at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn make_trade(direction: Direction) -> Trade {
        let opened_at = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        Trade {
            id: TradeId::from("t-1"),
            user_id: UserId::from("u-1"),
            account_id: AccountId::from("a-1"),
            direction,
            instrument: InstrumentId::from("BTCUSD"),
            amount: dec!(100),
            entry_price: 50_000.0,
            exit_price: None,
            payout: dec!(0.8),
            status: TradeStatus::Open,
            opened_at,
            expires_at: opened_at + chrono::Duration::seconds(30),
            closed_at: None,
        }
    }

    #[test]
    fn equal_prices_tie_in_both_directions() {
        assert_eq!(
            TradeStatus::resolve(Direction::Call, 50_000.0, 50_000.0),
            TradeStatus::Tie
        );
        assert_eq!(
            TradeStatus::resolve(Direction::Put, 50_000.0, 50_000.0),
            TradeStatus::Tie
        );
    }

    #[test]
    fn direction_decides_win_or_loss() {
        assert_eq!(
            TradeStatus::resolve(Direction::Call, 100.0, 101.0),
            TradeStatus::Win
        );
        assert_eq!(
            TradeStatus::resolve(Direction::Call, 100.0, 99.0),
            TradeStatus::Loss
        );
        assert_eq!(
            TradeStatus::resolve(Direction::Put, 100.0, 99.0),
            TradeStatus::Win
        );
        assert_eq!(
            TradeStatus::resolve(Direction::Put, 100.0, 101.0),
            TradeStatus::Loss
        );
    }

    #[test]
    fn credit_amounts() {
        let trade = make_trade(Direction::Call);
        assert_eq!(trade.credit_for(TradeStatus::Win), dec!(180));
        assert_eq!(trade.credit_for(TradeStatus::Tie), dec!(100));
        assert_eq!(trade.credit_for(TradeStatus::Loss), Decimal::ZERO);
    }

    #[test]
    fn close_is_write_once() {
        let mut trade = make_trade(Direction::Put);
        let closed_at = trade.expires_at;

        assert!(trade.close(TradeStatus::Win, 49_900.0, closed_at));
        assert!(!trade.close(TradeStatus::Loss, 50_100.0, closed_at));

        assert_eq!(trade.status, TradeStatus::Win);
        assert_eq!(trade.exit_price, Some(49_900.0));
    }

    #[test]
    fn remaining_secs_floors_and_clamps() {
        let trade = make_trade(Direction::Call);
        let now = trade.opened_at + chrono::Duration::milliseconds(1_500);
        assert_eq!(trade.remaining_secs(now), 28);
        assert_eq!(trade.remaining_secs(trade.expires_at), 0);
        assert_eq!(
            trade.remaining_secs(trade.expires_at + chrono::Duration::seconds(3)),
            0
        );
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("call".parse::<Direction>().unwrap(), Direction::Call);
        assert_eq!(" PUT ".parse::<Direction>().unwrap(), Direction::Put);
        assert!(matches!(
            "HOLD".parse::<Direction>(),
            Err(TradeError::InvalidDirection(_))
        ));
    }
}
