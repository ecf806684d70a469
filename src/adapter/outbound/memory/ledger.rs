//! In-memory ledger.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{
    confirmed_sum, Account, AccountId, Transaction, TransactionKind, UserId,
};
use crate::error::LedgerError;
use crate::port::{Clock, Ledger, SystemClock};

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    entries: HashMap<AccountId, Vec<Transaction>>,
    by_user: HashMap<UserId, AccountId>,
}

/// Ledger holding accounts and entries behind a single lock, so an append
/// and its balance projection update are one atomic step.
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
    clock: Arc<dyn Clock>,
}

impl MemoryLedger {
    /// Create an empty ledger stamping entries with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty ledger stamping entries with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            clock,
        }
    }

    /// Open a zero-balance account for `user`, or return the existing one.
    pub fn open_account(&self, user: &UserId) -> Account {
        let mut state = self.state.lock();
        if let Some(existing) = state
            .by_user
            .get(user)
            .and_then(|id| state.accounts.get(id))
        {
            return existing.clone();
        }
        let account = Account {
            id: AccountId::generate(),
            user_id: user.clone(),
            balance: Decimal::ZERO,
        };
        state.by_user.insert(user.clone(), account.id.clone());
        state.entries.insert(account.id.clone(), Vec::new());
        state.accounts.insert(account.id.clone(), account.clone());
        account
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn account(&self, id: &AccountId) -> Result<Option<Account>, LedgerError> {
        Ok(self.state.lock().accounts.get(id).cloned())
    }

    async fn account_for_user(&self, user: &UserId) -> Result<Option<Account>, LedgerError> {
        let state = self.state.lock();
        Ok(state
            .by_user
            .get(user)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn balance(&self, id: &AccountId) -> Result<Decimal, LedgerError> {
        let state = self.state.lock();
        let entries = state
            .entries
            .get(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))?;
        Ok(confirmed_sum(entries))
    }

    async fn apply(
        &self,
        id: &AccountId,
        kind: TransactionKind,
        amount: Decimal,
        reference: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let LedgerState {
            accounts, entries, ..
        } = &mut *state;

        let account = accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))?;
        let log = entries.entry(id.clone()).or_default();

        if let Some(ref key) = reference {
            if let Some(existing) = log
                .iter()
                .find(|t| t.kind == kind && t.reference.as_deref() == Some(key.as_str()))
            {
                return Ok(existing.clone());
            }
        }

        let available = confirmed_sum(log.iter());
        if amount < Decimal::ZERO && available + amount < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                account: id.to_string(),
                available,
                required: -amount,
            });
        }

        let transaction = Transaction::confirmed(id.clone(), kind, amount, reference, now);
        log.push(transaction.clone());
        account.balance = available + amount;
        Ok(transaction)
    }

    async fn transactions(&self, id: &AccountId) -> Result<Vec<Transaction>, LedgerError> {
        self.state
            .lock()
            .entries
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn cached_balance_tracks_entries() {
        let ledger = MemoryLedger::new();
        let account = ledger.open_account(&UserId::from("u-1"));

        ledger.deposit(&account.id, dec!(500)).await.unwrap();
        ledger.withdraw(&account.id, dec!(120)).await.unwrap();
        ledger
            .apply(&account.id, TransactionKind::Bonus, dec!(20), None)
            .await
            .unwrap();

        let derived = ledger.balance(&account.id).await.unwrap();
        let cached = ledger.account(&account.id).await.unwrap().unwrap().balance;
        assert_eq!(derived, dec!(400));
        assert_eq!(cached, derived);
    }

    #[tokio::test]
    async fn overdraft_is_rejected_without_writing() {
        let ledger = MemoryLedger::new();
        let account = ledger.open_account(&UserId::from("u-1"));
        ledger.deposit(&account.id, dec!(50)).await.unwrap();

        let result = ledger.withdraw(&account.id, dec!(80)).await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger.transactions(&account.id).await.unwrap().len(), 1);
        assert_eq!(ledger.balance(&account.id).await.unwrap(), dec!(50));
    }

    #[tokio::test]
    async fn referenced_entries_are_written_once() {
        let ledger = MemoryLedger::new();
        let account = ledger.open_account(&UserId::from("u-1"));

        let first = ledger
            .apply(
                &account.id,
                TransactionKind::TradeResult,
                dec!(180),
                Some("trade-1".into()),
            )
            .await
            .unwrap();
        let second = ledger
            .apply(
                &account.id,
                TransactionKind::TradeResult,
                dec!(180),
                Some("trade-1".into()),
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(ledger.balance(&account.id).await.unwrap(), dec!(180));
    }

    #[tokio::test]
    async fn open_account_is_idempotent_per_user() {
        let ledger = MemoryLedger::new();
        let user = UserId::from("u-1");
        let a = ledger.open_account(&user);
        let b = ledger.open_account(&user);
        assert_eq!(a.id, b.id);
        assert_eq!(
            ledger.account_for_user(&user).await.unwrap().map(|a| a.id),
            Some(a.id)
        );
    }

    #[tokio::test]
    async fn unknown_account() {
        let ledger = MemoryLedger::new();
        let missing = AccountId::from("nope");
        assert!(ledger.account(&missing).await.unwrap().is_none());
        assert!(matches!(
            ledger.balance(&missing).await,
            Err(LedgerError::AccountNotFound(_))
        ));
    }
}
