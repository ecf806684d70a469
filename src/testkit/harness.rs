//! A trade service wired over in-memory adapters and a manual clock.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use super::clock::ManualClock;
use super::domain;
use super::ports::FlakyLedger;
use crate::adapter::outbound::memory::{MemoryLedger, MemoryPriceStore, MemoryTradeStore};
use crate::application::event::EventBus;
use crate::application::market::{MarketStatusResolver, DEFAULT_ALTERNATIVES};
use crate::application::trade::{TradeService, TradeSettings};
use crate::domain::{AccountId, InstrumentId, InstrumentRegistry, MarketCalendar, PriceTick, TransactionKind, UserId};
use crate::port::{Clock, Ledger, PriceStore};

/// BTCUSD at an 80% payout, a clock parked on Monday noon and a
/// 1ms settlement backoff.
///
/// The service writes through [`FlakyLedger`]; `ledger` is the underlying
/// store for direct assertions.
pub struct TradeHarness {
    pub clock: Arc<ManualClock>,
    pub registry: Arc<InstrumentRegistry>,
    pub prices: Arc<MemoryPriceStore>,
    pub trades: Arc<MemoryTradeStore>,
    pub ledger: Arc<MemoryLedger>,
    pub flaky: Arc<FlakyLedger>,
    pub bus: Arc<EventBus>,
    pub resolver: Arc<MarketStatusResolver>,
    pub service: Arc<TradeService>,
}

impl TradeHarness {
    /// Harness with an always-open BTCUSD market.
    pub fn new() -> Self {
        Self::with_calendar(MarketCalendar::always_open())
    }

    pub fn with_calendar(calendar: MarketCalendar) -> Self {
        let clock = Arc::new(ManualClock::monday_noon());
        let dyn_clock: Arc<dyn Clock> = clock.clone();

        let registry = Arc::new(InstrumentRegistry::new(vec![(
            domain::btc(calendar),
            Some(80),
        )]));
        let prices = Arc::new(MemoryPriceStore::new());
        let trades = Arc::new(MemoryTradeStore::new());
        let ledger = Arc::new(MemoryLedger::with_clock(dyn_clock.clone()));
        let flaky = Arc::new(FlakyLedger::new(ledger.clone()));
        let bus = Arc::new(EventBus::new(&registry.ids(), 256));
        let resolver = Arc::new(MarketStatusResolver::new(
            registry.clone(),
            dyn_clock.clone(),
            DEFAULT_ALTERNATIVES,
        ));

        let settings = TradeSettings {
            settlement_backoff: Duration::from_millis(1),
            ..TradeSettings::default()
        };
        let service = Arc::new(TradeService::new(
            settings,
            registry.clone(),
            resolver.clone(),
            prices.clone(),
            trades.clone(),
            flaky.clone(),
            bus.clone(),
            dyn_clock,
        ));

        Self {
            clock,
            registry,
            prices,
            trades,
            ledger,
            flaky,
            bus,
            resolver,
            service,
        }
    }

    /// Open (or reuse) the user's account and credit it with a bonus.
    pub async fn fund(&self, user: &str, amount: Decimal) -> AccountId {
        let account = self.ledger.open_account(&UserId::from(user));
        if amount > Decimal::ZERO {
            self.ledger
                .apply(&account.id, TransactionKind::Bonus, amount, None)
                .await
                .expect("bonus credit");
        }
        account.id
    }

    /// Store a BTCUSD tick stamped with the current clock time.
    pub fn set_price(&self, price: f64) {
        let tick = PriceTick::new(self.btc(), price, self.clock.now());
        self.prices.put(&tick).expect("memory price store");
    }

    pub fn btc(&self) -> InstrumentId {
        InstrumentId::from("BTCUSD")
    }
}

impl Default for TradeHarness {
    fn default() -> Self {
        Self::new()
    }
}
