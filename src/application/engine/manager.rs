//! Engine manager.
//!
//! Owns one generator/aggregator pair per configured instrument and gives
//! them a single start/stop lifecycle. The event bus and candle history are
//! shared with the rest of the application and outlive restarts, so
//! subscribers keep receiving after a stop/start cycle.
//!
//! # Architecture
//!
//! ```text
//! PriceGenerator --put--> PriceStore
//!       |
//!       +--(broadcast)--> EventBus[instrument]
//!       |
//!       +--(unbounded mpsc)--> CandleAggregator --> CandleHistory
//!                                     |
//!                                     +--(broadcast)--> EventBus[instrument]
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::candle::{CandleAggregator, CandleHistory};
use crate::application::event::{EventBus, MarketEvent};
use crate::application::price::PriceGenerator;
use crate::domain::{Candle, InstrumentId, InstrumentRegistry, Timeframe};
use crate::port::{Clock, PriceStore};

/// Engine tuning shared by every instrument.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Interval between generated ticks.
    pub tick_interval: Duration,
    /// Timeframe folded directly from ticks.
    pub base_timeframe: Timeframe,
    /// Timeframes folded from sealed base candles.
    pub derived_timeframes: Vec<Timeframe>,
    /// RNG seed; each instrument gets `seed + index`.
    pub seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(500),
            base_timeframe: Timeframe::FIVE_SECONDS,
            derived_timeframes: [60, 300, 900]
                .into_iter()
                .filter_map(Timeframe::from_secs)
                .collect(),
            seed: None,
        }
    }
}

struct Pair {
    generator: PriceGenerator,
    aggregator: JoinHandle<()>,
}

struct Fleet {
    shutdown_tx: watch::Sender<bool>,
    pairs: Vec<Pair>,
}

/// Start/stop lifecycle for the whole price engine.
pub struct EngineManager {
    registry: Arc<InstrumentRegistry>,
    settings: EngineSettings,
    store: Arc<dyn PriceStore>,
    bus: Arc<EventBus>,
    history: Arc<CandleHistory>,
    clock: Arc<dyn Clock>,
    fleet: Mutex<Option<Fleet>>,
}

impl EngineManager {
    pub fn new(
        registry: Arc<InstrumentRegistry>,
        settings: EngineSettings,
        store: Arc<dyn PriceStore>,
        bus: Arc<EventBus>,
        history: Arc<CandleHistory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            settings,
            store,
            bus,
            history,
            clock,
            fleet: Mutex::new(None),
        }
    }

    /// Start every generator/aggregator pair.
    ///
    /// Returns `false` if the engine is already running.
    pub fn start(&self) -> bool {
        let mut fleet = self.fleet.lock();
        if fleet.is_some() {
            debug!("Engine already running");
            return false;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut pairs = Vec::with_capacity(self.registry.len());

        for (index, instrument) in self.registry.instruments().iter().enumerate() {
            let Some(market_tx) = self.bus.market_sender(instrument.id()) else {
                warn!(instrument = %instrument.id(), "No market channel for instrument, skipping");
                continue;
            };

            let (tick_tx, tick_rx) = mpsc::unbounded_channel();
            let aggregator = CandleAggregator::new(
                instrument.id().clone(),
                self.settings.base_timeframe,
                &self.settings.derived_timeframes,
            );
            let aggregator = tokio::spawn(aggregator.run(
                tick_rx,
                market_tx.clone(),
                Arc::clone(&self.history),
                shutdown_rx.clone(),
            ));

            let mut generator = PriceGenerator::new(
                instrument.clone(),
                self.settings.tick_interval,
                Arc::clone(&self.store),
                market_tx,
                Arc::clone(&self.clock),
            );
            if let Some(seed) = self.settings.seed {
                generator = generator.with_seed(seed.wrapping_add(index as u64));
            }
            generator.start(tick_tx);

            pairs.push(Pair {
                generator,
                aggregator,
            });
        }

        info!(instruments = pairs.len(), "Engine started");
        *fleet = Some(Fleet { shutdown_tx, pairs });
        true
    }

    /// Stop every pair, drop pending ticks and wait for the tasks to exit.
    ///
    /// Returns `false` if the engine was not running.
    pub async fn stop(&self) -> bool {
        let Some(fleet) = self.fleet.lock().take() else {
            debug!("Engine not running");
            return false;
        };

        let _ = fleet.shutdown_tx.send(true);
        for pair in fleet.pairs {
            pair.generator.stop().await;
            if let Err(e) = pair.aggregator.await {
                warn!(error = %e, "Aggregator task ended abnormally");
            }
        }

        info!("Engine stopped");
        true
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.fleet.lock().is_some()
    }

    /// Latest price, or `None` for unknown instruments and instruments that
    /// have not produced a tick yet.
    #[must_use]
    pub fn current_price(&self, instrument: &InstrumentId) -> Option<f64> {
        self.registry.get(instrument)?;
        self.store.get(instrument).map(|tick| tick.price)
    }

    #[must_use]
    pub fn instrument_ids(&self) -> Vec<InstrumentId> {
        self.registry.ids()
    }

    /// Receiver for one instrument's price and candle events.
    #[must_use]
    pub fn subscribe(&self, instrument: &InstrumentId) -> Option<broadcast::Receiver<MarketEvent>> {
        self.bus.subscribe_market(instrument)
    }

    /// Sealed candle history, oldest first.
    #[must_use]
    pub fn candles(&self, instrument: &InstrumentId, timeframe: Timeframe) -> Vec<Candle> {
        self.history.sealed(instrument, timeframe)
    }

    /// The candle currently accumulating for a timeframe.
    #[must_use]
    pub fn open_candle(&self, instrument: &InstrumentId, timeframe: Timeframe) -> Option<Candle> {
        self.history.open(instrument, timeframe)
    }

    /// Base timeframe followed by the derived ones.
    #[must_use]
    pub fn timeframes(&self) -> Vec<Timeframe> {
        let mut all = vec![self.settings.base_timeframe];
        all.extend(
            self.settings
                .derived_timeframes
                .iter()
                .copied()
                .filter(|tf| *tf != self.settings.base_timeframe),
        );
        all
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}
