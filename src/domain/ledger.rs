//! Append-only ledger entries and account projections.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{AccountId, TransactionId, UserId};

/// What a ledger entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    /// Stake held when a trade opens.
    TradeStake,
    /// Credit (or zero-amount record) written at settlement.
    TradeResult,
    Bonus,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdraw => "WITHDRAW",
            TransactionKind::TradeStake => "TRADE_STAKE",
            TransactionKind::TradeResult => "TRADE_RESULT",
            TransactionKind::Bonus => "BONUS",
        };
        f.write_str(label)
    }
}

/// Confirmation state of a ledger entry. Only confirmed entries count
/// toward the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

/// One immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    /// Signed amount: credits positive, debits negative.
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    /// Business key (the trade id for trade entries).
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a confirmed entry.
    #[must_use]
    pub fn confirmed(
        account_id: AccountId,
        kind: TransactionKind,
        amount: Decimal,
        reference: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            account_id,
            amount,
            kind,
            status: TransactionStatus::Confirmed,
            reference,
            created_at,
        }
    }
}

/// Account with its cached balance projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    /// Always equal to the sum of confirmed transactions.
    pub balance: Decimal,
}

/// Sum of confirmed transaction amounts.
#[must_use]
pub fn confirmed_sum<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Decimal {
    transactions
        .into_iter()
        .filter(|t| t.status == TransactionStatus::Confirmed)
        .fold(Decimal::ZERO, |acc, t| acc + t.amount)
}
