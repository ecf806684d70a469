//! In-memory trade store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::{Trade, TradeId, UserId};
use crate::error::StoreError;
use crate::port::TradeStore;

/// In-memory trade store.
#[derive(Debug, Default)]
pub struct MemoryTradeStore {
    trades: RwLock<HashMap<TradeId, Trade>>,
}

impl MemoryTradeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TradeStore for MemoryTradeStore {
    async fn create(&self, trade: &Trade) -> Result<(), StoreError> {
        self.trades.write().insert(trade.id.clone(), trade.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &TradeId) -> Result<Option<Trade>, StoreError> {
        Ok(self.trades.read().get(id).cloned())
    }

    async fn find_open(&self) -> Result<Vec<Trade>, StoreError> {
        let mut open: Vec<Trade> = self
            .trades
            .read()
            .values()
            .filter(|t| t.is_open())
            .cloned()
            .collect();
        open.sort_by_key(|t| t.expires_at);
        Ok(open)
    }

    async fn find_open_expired(&self, now: DateTime<Utc>) -> Result<Vec<Trade>, StoreError> {
        let mut expired: Vec<Trade> = self
            .trades
            .read()
            .values()
            .filter(|t| t.is_open() && t.is_expired(now))
            .cloned()
            .collect();
        expired.sort_by_key(|t| t.expires_at);
        Ok(expired)
    }

    async fn find_open_by_user(&self, user: &UserId) -> Result<Vec<Trade>, StoreError> {
        let mut open: Vec<Trade> = self
            .trades
            .read()
            .values()
            .filter(|t| t.is_open() && &t.user_id == user)
            .cloned()
            .collect();
        open.sort_by_key(|t| t.opened_at);
        Ok(open)
    }

    async fn update_result(&self, trade: &Trade) -> Result<bool, StoreError> {
        let mut trades = self.trades.write();
        let stored = trades
            .get_mut(&trade.id)
            .ok_or_else(|| StoreError::NotFound(trade.id.to_string()))?;
        if !stored.is_open() {
            return Ok(false);
        }
        *stored = trade.clone();
        Ok(true)
    }
}
