//! Port implementations that fail on demand.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::adapter::outbound::memory::MemoryLedger;
use crate::domain::{Account, AccountId, InstrumentId, PriceTick, Transaction, TransactionKind, UserId};
use crate::error::{LedgerError, StoreError};
use crate::port::{Ledger, PriceStore};

/// Ledger whose next `n` writes fail with [`LedgerError::Unavailable`].
///
/// Reads always go straight to the wrapped ledger.
pub struct FlakyLedger {
    inner: Arc<MemoryLedger>,
    failures: AtomicU32,
    attempts: AtomicU32,
}

impl FlakyLedger {
    pub fn new(inner: Arc<MemoryLedger>) -> Self {
        Self {
            inner,
            failures: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Writes attempted so far, failed ones included.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ledger for FlakyLedger {
    async fn account(&self, id: &AccountId) -> Result<Option<Account>, LedgerError> {
        self.inner.account(id).await
    }

    async fn account_for_user(&self, user: &UserId) -> Result<Option<Account>, LedgerError> {
        self.inner.account_for_user(user).await
    }

    async fn balance(&self, id: &AccountId) -> Result<Decimal, LedgerError> {
        self.inner.balance(id).await
    }

    async fn apply(
        &self,
        id: &AccountId,
        kind: TransactionKind,
        amount: Decimal,
        reference: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(LedgerError::Unavailable("injected failure".into()));
        }
        self.inner.apply(id, kind, amount, reference).await
    }

    async fn transactions(&self, id: &AccountId) -> Result<Vec<Transaction>, LedgerError> {
        self.inner.transactions(id).await
    }
}

/// Price store that rejects every write and never has a price.
#[derive(Debug, Default)]
pub struct FailingPriceStore;

impl PriceStore for FailingPriceStore {
    fn put(&self, _tick: &PriceTick) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("injected failure".into()))
    }

    fn get(&self, _instrument: &InstrumentId) -> Option<PriceTick> {
        None
    }
}
