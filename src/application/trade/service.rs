//! Trade opening and settlement.
//!
//! Settlement is at-most-once per trade. A trade is claimed in a
//! concurrent set before anything is read, the stored status is checked
//! under the claim, and the store only accepts a terminal write for a trade
//! that is still OPEN. The ledger credit is written first and retried; the
//! trade is marked terminal only after the credit is durable. The ledger
//! deduplicates on the trade id, so repeating the credit after a partial
//! failure never pays twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::application::event::{EventBus, TradeEvent};
use crate::application::market::MarketStatusResolver;
use crate::domain::{
    payout_ratio, AccountId, Direction, InstrumentId, InstrumentRegistry, Trade, TradeId,
    TradeStatus, TransactionKind, UserId,
};
use crate::error::{Error, LedgerError, Result, TradeError};
use crate::port::{Clock, Ledger, PriceStore, TradeStore};

/// Trade validation and settlement tuning.
#[derive(Debug, Clone)]
pub struct TradeSettings {
    pub min_expiration_secs: u64,
    pub max_expiration_secs: u64,
    pub expiration_step_secs: u64,
    /// Ledger write attempts per settlement before giving up until the next sweep.
    pub settlement_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub settlement_backoff: Duration,
}

impl Default for TradeSettings {
    fn default() -> Self {
        Self {
            min_expiration_secs: 5,
            max_expiration_secs: 300,
            expiration_step_secs: 5,
            settlement_attempts: 3,
            settlement_backoff: Duration::from_millis(200),
        }
    }
}

impl TradeSettings {
    fn validate_expiration(&self, seconds: u64) -> std::result::Result<(), TradeError> {
        let aligned = self.expiration_step_secs == 0 || seconds % self.expiration_step_secs == 0;
        if aligned && (self.min_expiration_secs..=self.max_expiration_secs).contains(&seconds) {
            Ok(())
        } else {
            Err(TradeError::InvalidExpiration {
                seconds,
                step: self.expiration_step_secs,
                min: self.min_expiration_secs,
                max: self.max_expiration_secs,
            })
        }
    }
}

/// A request to open a trade on behalf of an authenticated user.
#[derive(Debug, Clone)]
pub struct OpenTradeRequest {
    pub user_id: UserId,
    pub account_id: AccountId,
    pub instrument: InstrumentId,
    pub direction: Direction,
    pub amount: Decimal,
    pub expiration_secs: u64,
}

/// Result of a settlement attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SettleOutcome {
    /// This call moved the trade to a terminal state.
    Settled(Trade),
    /// The trade was already terminal; nothing was written.
    AlreadySettled(Trade),
    /// Another caller holds the settlement claim.
    InProgress,
    /// The trade has not reached its expiry.
    NotExpired(Trade),
}

/// Outcome fixed on the first settlement attempt so retries write the
/// same result.
#[derive(Debug, Clone, Copy)]
struct Decision {
    status: TradeStatus,
    exit_price: f64,
    closed_at: DateTime<Utc>,
    credit: Decimal,
}

/// Releases a settlement claim on drop.
struct Claim<'a> {
    claims: &'a DashSet<TradeId>,
    id: TradeId,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.claims.remove(&self.id);
    }
}

/// Opens trades and settles them at expiry.
pub struct TradeService {
    settings: TradeSettings,
    registry: Arc<InstrumentRegistry>,
    resolver: Arc<MarketStatusResolver>,
    prices: Arc<dyn PriceStore>,
    trades: Arc<dyn TradeStore>,
    ledger: Arc<dyn Ledger>,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    claims: DashSet<TradeId>,
    decisions: DashMap<TradeId, Decision>,
}

impl TradeService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: TradeSettings,
        registry: Arc<InstrumentRegistry>,
        resolver: Arc<MarketStatusResolver>,
        prices: Arc<dyn PriceStore>,
        trades: Arc<dyn TradeStore>,
        ledger: Arc<dyn Ledger>,
        bus: Arc<EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            registry,
            resolver,
            prices,
            trades,
            ledger,
            bus,
            clock,
            claims: DashSet::new(),
            decisions: DashMap::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &TradeSettings {
        &self.settings
    }

    /// Validate, hold the stake and persist a new OPEN trade.
    pub async fn open_trade(&self, request: OpenTradeRequest) -> Result<Trade> {
        if request.amount <= Decimal::ZERO {
            return Err(TradeError::InvalidAmount {
                amount: request.amount,
            }
            .into());
        }
        self.settings.validate_expiration(request.expiration_secs)?;

        if self.registry.get(&request.instrument).is_none() {
            return Err(TradeError::UnknownInstrument(request.instrument.to_string()).into());
        }

        let account = self
            .ledger
            .account(&request.account_id)
            .await?
            .ok_or_else(|| TradeError::AccountNotFound(request.account_id.to_string()))?;
        if account.user_id != request.user_id {
            return Err(TradeError::Forbidden {
                resource: "account",
                id: account.id.to_string(),
                user_id: request.user_id.to_string(),
            }
            .into());
        }

        let now = self.clock.now();
        let status = self.resolver.status_at(&request.instrument, now)?;
        if !status.is_open() {
            return Err(TradeError::MarketClosed {
                instrument: request.instrument.to_string(),
                reason: status.message,
            }
            .into());
        }

        let entry = self
            .prices
            .get(&request.instrument)
            .ok_or_else(|| TradeError::PriceUnavailable(request.instrument.to_string()))?;

        let available = self.ledger.balance(&account.id).await?;
        if available < request.amount {
            return Err(TradeError::InsufficientBalance {
                available,
                required: request.amount,
            }
            .into());
        }

        let payout = self
            .registry
            .payout_percent(&request.instrument)
            .map(payout_ratio)
            .ok_or_else(|| TradeError::UnknownInstrument(request.instrument.to_string()))?;

        let trade = Trade {
            id: TradeId::new(),
            user_id: request.user_id,
            account_id: account.id,
            direction: request.direction,
            instrument: request.instrument,
            amount: request.amount,
            entry_price: entry.price,
            exit_price: None,
            payout,
            status: TradeStatus::Open,
            opened_at: now,
            expires_at: now + chrono::Duration::seconds(request.expiration_secs as i64),
            closed_at: None,
        };

        self.ledger
            .apply(
                &trade.account_id,
                TransactionKind::TradeStake,
                -trade.amount,
                Some(trade.id.to_string()),
            )
            .await
            .map_err(|e| match e {
                LedgerError::InsufficientFunds {
                    available,
                    required,
                    ..
                } => Error::Trade(TradeError::InsufficientBalance {
                    available,
                    required,
                }),
                other => Error::Ledger(other),
            })?;

        if let Err(e) = self.trades.create(&trade).await {
            warn!(trade_id = %trade.id, error = %e, "Failed to persist trade, refunding stake");
            if let Err(refund) = self
                .ledger
                .apply(
                    &trade.account_id,
                    TransactionKind::TradeResult,
                    trade.amount,
                    Some(trade.id.to_string()),
                )
                .await
            {
                warn!(trade_id = %trade.id, error = %refund, "Stake refund failed");
            }
            return Err(e.into());
        }

        info!(
            trade_id = %trade.id,
            user_id = %trade.user_id,
            instrument = %trade.instrument,
            direction = %trade.direction,
            amount = %trade.amount,
            entry_price = trade.entry_price,
            expires_at = %trade.expires_at,
            "Trade opened"
        );
        self.bus.publish_trade(TradeEvent::Opened(trade.clone()));
        Ok(trade)
    }

    /// Settle one trade if it has expired.
    ///
    /// Calling this for a trade that is already terminal, or that another
    /// caller is settling, is a no-op. A ledger failure leaves the trade
    /// OPEN and is returned as an error so the next sweep can retry.
    pub async fn settle(&self, id: &TradeId) -> Result<SettleOutcome> {
        if !self.claims.insert(id.clone()) {
            debug!(trade_id = %id, "Settlement already in progress");
            return Ok(SettleOutcome::InProgress);
        }
        let _claim = Claim {
            claims: &self.claims,
            id: id.clone(),
        };

        let trade = self
            .trades
            .find_by_id(id)
            .await?
            .ok_or_else(|| TradeError::TradeNotFound(id.to_string()))?;
        if !trade.is_open() {
            self.decisions.remove(id);
            return Ok(SettleOutcome::AlreadySettled(trade));
        }

        let now = self.clock.now();
        if !trade.is_expired(now) {
            return Ok(SettleOutcome::NotExpired(trade));
        }

        let decision = match self.decisions.get(id).map(|d| *d) {
            Some(decision) => decision,
            None => {
                let exit = self
                    .prices
                    .get(&trade.instrument)
                    .ok_or_else(|| TradeError::PriceUnavailable(trade.instrument.to_string()))?;
                let status = TradeStatus::resolve(trade.direction, trade.entry_price, exit.price);
                let decision = Decision {
                    status,
                    exit_price: exit.price,
                    closed_at: now,
                    credit: trade.credit_for(status),
                };
                self.decisions.insert(id.clone(), decision);
                decision
            }
        };

        self.write_result(&trade, &decision).await?;

        let mut closed = trade.clone();
        closed.close(decision.status, decision.exit_price, decision.closed_at);
        if !self.trades.update_result(&closed).await? {
            self.decisions.remove(id);
            let current = self
                .trades
                .find_by_id(id)
                .await?
                .ok_or_else(|| TradeError::TradeNotFound(id.to_string()))?;
            return Ok(SettleOutcome::AlreadySettled(current));
        }
        self.decisions.remove(id);

        info!(
            trade_id = %closed.id,
            user_id = %closed.user_id,
            status = %closed.status,
            entry_price = closed.entry_price,
            exit_price = decision.exit_price,
            credit = %decision.credit,
            "Trade settled"
        );
        self.bus.publish_trade(TradeEvent::Closed(closed.clone()));
        Ok(SettleOutcome::Settled(closed))
    }

    /// Write the settlement entry, retrying with exponential backoff.
    async fn write_result(&self, trade: &Trade, decision: &Decision) -> Result<()> {
        let attempts = self.settings.settlement_attempts.max(1);
        let mut delay = self.settings.settlement_backoff;
        let mut attempt = 1;

        loop {
            match self
                .ledger
                .apply(
                    &trade.account_id,
                    TransactionKind::TradeResult,
                    decision.credit,
                    Some(trade.id.to_string()),
                )
                .await
            {
                Ok(_) => return Ok(()),
                Err(e) if attempt < attempts => {
                    warn!(
                        trade_id = %trade.id,
                        attempt,
                        error = %e,
                        "Settlement ledger write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        trade_id = %trade.id,
                        attempts,
                        error = %e,
                        "Settlement ledger write failed, trade stays open"
                    );
                    return Err(e.into());
                }
            }
        }
    }

    /// Settle every open trade that has reached expiry, oldest first.
    ///
    /// Individual failures are logged and left for the next sweep.
    pub async fn settle_expired(&self) -> Result<Vec<Trade>> {
        let expired = self.trades.find_open_expired(self.clock.now()).await?;
        let mut settled = Vec::with_capacity(expired.len());

        for trade in expired {
            match self.settle(&trade.id).await {
                Ok(SettleOutcome::Settled(closed)) => settled.push(closed),
                Ok(_) => {}
                Err(e) => warn!(trade_id = %trade.id, error = %e, "Settlement failed"),
            }
        }

        if !settled.is_empty() {
            debug!(count = settled.len(), "Settlement sweep complete");
        }
        Ok(settled)
    }

    /// Look up a trade owned by `user`.
    pub async fn trade_for_user(&self, user: &UserId, id: &TradeId) -> Result<Trade> {
        let trade = self
            .trades
            .find_by_id(id)
            .await?
            .ok_or_else(|| TradeError::TradeNotFound(id.to_string()))?;
        if &trade.user_id != user {
            return Err(TradeError::Forbidden {
                resource: "trade",
                id: id.to_string(),
                user_id: user.to_string(),
            }
            .into());
        }
        Ok(trade)
    }

    /// A user's OPEN trades.
    pub async fn open_trades_for(&self, user: &UserId) -> Result<Vec<Trade>> {
        Ok(self.trades.find_open_by_user(user).await?)
    }

    /// Every OPEN trade.
    pub async fn open_trades(&self) -> Result<Vec<Trade>> {
        Ok(self.trades.find_open().await?)
    }

    /// Administrative payout change. Applies to trades opened afterwards.
    pub fn set_payout(&self, instrument: &InstrumentId, percent: u32) -> Result<()> {
        self.registry.set_payout(instrument, percent)?;
        info!(instrument = %instrument, payout = percent, "Payout updated");
        Ok(())
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
