//! Composition root: builds every service from configuration.

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::outbound::memory::{MemoryLedger, MemoryPriceStore, MemoryTradeStore};
use crate::application::broadcast::Broadcaster;
use crate::application::candle::CandleHistory;
use crate::application::engine::EngineManager;
use crate::application::event::EventBus;
use crate::application::market::MarketStatusResolver;
use crate::application::snapshot::SnapshotService;
use crate::application::trade::{TradeMonitor, TradeService};
use crate::domain::{InstrumentRegistry, TransactionKind, UserId};
use crate::error::Result;
use crate::infrastructure::config::instrument::build_registry;
use crate::infrastructure::config::settings::Config;
use crate::port::{Clock, Ledger};

/// Every long-lived component, shared as `Arc` handles.
pub struct Services {
    pub clock: Arc<dyn Clock>,
    pub registry: Arc<InstrumentRegistry>,
    pub prices: Arc<MemoryPriceStore>,
    pub trades: Arc<MemoryTradeStore>,
    pub ledger: Arc<MemoryLedger>,
    pub bus: Arc<EventBus>,
    pub history: Arc<CandleHistory>,
    pub resolver: Arc<MarketStatusResolver>,
    pub engine: Arc<EngineManager>,
    pub trading: Arc<TradeService>,
    pub snapshots: Arc<SnapshotService>,
    pub broadcaster: Arc<Broadcaster>,
}

impl Services {
    /// Wire the object graph. Nothing is started.
    pub fn build(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let registry = Arc::new(build_registry(&config.instruments));
        let prices = Arc::new(MemoryPriceStore::new());
        let trades = Arc::new(MemoryTradeStore::new());
        let ledger = Arc::new(MemoryLedger::with_clock(clock.clone()));
        let bus = Arc::new(EventBus::new(&registry.ids(), config.engine.event_capacity));
        let history = Arc::new(CandleHistory::new(config.engine.history_limit));
        let resolver = Arc::new(MarketStatusResolver::new(
            registry.clone(),
            clock.clone(),
            config.broadcast.alternatives,
        ));

        let engine = Arc::new(EngineManager::new(
            registry.clone(),
            (&config.engine).into(),
            prices.clone(),
            bus.clone(),
            history.clone(),
            clock.clone(),
        ));

        let trading = Arc::new(TradeService::new(
            (&config.trading).into(),
            registry.clone(),
            resolver.clone(),
            prices.clone(),
            trades.clone(),
            ledger.clone(),
            bus.clone(),
            clock.clone(),
        ));

        let snapshots = Arc::new(SnapshotService::new(
            engine.clone(),
            resolver.clone(),
            trading.clone(),
            clock.clone(),
        ));

        let broadcaster = Arc::new(Broadcaster::new(
            (&config.broadcast).into(),
            bus.clone(),
            clock.clone(),
        ));

        info!(
            instruments = registry.len(),
            timeframes = engine.timeframes().len(),
            "Services built"
        );

        Self {
            clock,
            registry,
            prices,
            trades,
            ledger,
            bus,
            history,
            resolver,
            engine,
            trading,
            snapshots,
            broadcaster,
        }
    }

    /// Open configured demo accounts and credit their starting balance.
    ///
    /// Each credit is a `BONUS` entry referenced by the user id, so seeding
    /// twice does not double the balance.
    pub async fn seed_accounts(&self, config: &Config) -> Result<usize> {
        let mut seeded = 0;
        for entry in &config.accounts {
            let user = UserId::new(entry.user_id.trim());
            let account = self.ledger.open_account(&user);
            if entry.balance.is_zero() {
                seeded += 1;
                continue;
            }
            match self
                .ledger
                .apply(
                    &account.id,
                    TransactionKind::Bonus,
                    entry.balance,
                    Some(format!("seed:{user}")),
                )
                .await
            {
                Ok(_) => {
                    info!(user_id = %user, account_id = %account.id, balance = %entry.balance, "Seeded account");
                    seeded += 1;
                }
                Err(e) => {
                    warn!(user_id = %user, error = %e, "Failed to seed account");
                    return Err(e.into());
                }
            }
        }
        Ok(seeded)
    }

    /// Settlement and countdown timer at the configured interval.
    pub fn monitor(&self, config: &Config) -> TradeMonitor {
        TradeMonitor::new(
            self.trading.clone(),
            self.bus.clone(),
            config.trading.countdown_interval(),
        )
    }
}
