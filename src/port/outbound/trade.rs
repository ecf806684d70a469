//! Trade persistence port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Trade, TradeId, UserId};
use crate::error::StoreError;

/// Storage operations for trades.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Persist a newly opened trade.
    async fn create(&self, trade: &Trade) -> Result<(), StoreError>;

    /// Get a trade by ID.
    async fn find_by_id(&self, id: &TradeId) -> Result<Option<Trade>, StoreError>;

    /// All trades still in the OPEN state.
    async fn find_open(&self) -> Result<Vec<Trade>, StoreError>;

    /// OPEN trades whose expiry is at or before `now`, oldest expiry first.
    async fn find_open_expired(&self, now: DateTime<Utc>) -> Result<Vec<Trade>, StoreError>;

    /// OPEN trades belonging to one user.
    async fn find_open_by_user(&self, user: &UserId) -> Result<Vec<Trade>, StoreError>;

    /// Write the terminal result of a trade.
    ///
    /// Only succeeds when the stored trade is still OPEN; returns `false`
    /// without writing otherwise.
    async fn update_result(&self, trade: &Trade) -> Result<bool, StoreError>;
}
