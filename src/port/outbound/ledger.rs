//! Ledger port.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Account, AccountId, Transaction, TransactionKind, UserId};
use crate::error::LedgerError;

/// Account lookup and balance mutations.
///
/// The balance of an account is the sum of its confirmed transactions.
/// [`Ledger::apply`] is the only mutation point: it appends the entry and
/// moves the cached `Account::balance` by the same amount as one logical
/// operation, so the two can never diverge.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Look up an account by ID.
    async fn account(&self, id: &AccountId) -> Result<Option<Account>, LedgerError>;

    /// The user's real (non-demo) account.
    async fn account_for_user(&self, user: &UserId) -> Result<Option<Account>, LedgerError>;

    /// Ledger-derived balance (sum of confirmed transactions).
    async fn balance(&self, id: &AccountId) -> Result<Decimal, LedgerError>;

    /// Append a confirmed entry and update the cached balance by `amount`.
    ///
    /// When `reference` is set and an entry with the same account, kind and
    /// reference already exists, that entry is returned and nothing is
    /// written. Debits that would make the balance negative are rejected.
    async fn apply(
        &self,
        id: &AccountId,
        kind: TransactionKind,
        amount: Decimal,
        reference: Option<String>,
    ) -> Result<Transaction, LedgerError>;

    /// All entries for an account in append order.
    async fn transactions(&self, id: &AccountId) -> Result<Vec<Transaction>, LedgerError>;

    /// Credit an account.
    async fn deposit(&self, id: &AccountId, amount: Decimal) -> Result<Transaction, LedgerError> {
        self.apply(id, TransactionKind::Deposit, amount, None).await
    }

    /// Debit an account.
    async fn withdraw(&self, id: &AccountId, amount: Decimal) -> Result<Transaction, LedgerError> {
        self.apply(id, TransactionKind::Withdraw, -amount, None).await
    }
}
