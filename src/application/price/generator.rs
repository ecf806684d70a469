//! Bounded random-walk price generator.
//!
//! Each generator owns one instrument. While running it emits the starting
//! price immediately and then one stepped price per interval. Every tick is
//! written to the price store, published on the instrument's market channel
//! and forwarded to the candle aggregator over an unbounded channel.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::application::event::MarketEvent;
use crate::domain::{Instrument, PriceTick};
use crate::port::{Clock, PriceStore};

/// One random-walk step: `price + price * uniform(-v, +v)`, rounded to the
/// instrument's digits and clamped into `[min_price, max_price]`.
pub fn next_price<R: Rng + ?Sized>(instrument: &Instrument, price: f64, rng: &mut R) -> f64 {
    let model = instrument.model();
    let change = if model.volatility > 0.0 {
        price * rng.gen_range(-model.volatility..=model.volatility)
    } else {
        0.0
    };
    instrument
        .round_price(price + change)
        .clamp(model.min_price, model.max_price)
}

struct Running {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Price generator for a single instrument.
pub struct PriceGenerator {
    instrument: Instrument,
    interval: Duration,
    store: Arc<dyn PriceStore>,
    market_tx: broadcast::Sender<MarketEvent>,
    clock: Arc<dyn Clock>,
    seed: Option<u64>,
    running: Mutex<Option<Running>>,
}

impl PriceGenerator {
    /// Create a stopped generator.
    pub fn new(
        instrument: Instrument,
        interval: Duration,
        store: Arc<dyn PriceStore>,
        market_tx: broadcast::Sender<MarketEvent>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            instrument,
            interval,
            store,
            market_tx,
            clock,
            seed: None,
            running: Mutex::new(None),
        }
    }

    /// Use a deterministic RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Start emitting ticks, forwarding each one to `ticks`.
    ///
    /// Returns `false` without doing anything if already running.
    pub fn start(&self, ticks: mpsc::UnboundedSender<PriceTick>) -> bool {
        let mut running = self.running.lock();
        if running.is_some() {
            debug!(instrument = %self.instrument.id(), "Generator already running");
            return false;
        }

        let start_price = self
            .store
            .get(self.instrument.id())
            .map(|tick| tick.price)
            .unwrap_or(self.instrument.model().initial_price);

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let walk = Walk {
            instrument: self.instrument.clone(),
            price: start_price,
            rng,
            store: Arc::clone(&self.store),
            market_tx: self.market_tx.clone(),
            ticks,
            clock: Arc::clone(&self.clock),
        };
        let task = tokio::spawn(walk.run(self.interval, shutdown_rx));

        info!(
            instrument = %self.instrument.id(),
            price = start_price,
            interval_ms = self.interval.as_millis() as u64,
            "Price generator started"
        );
        *running = Some(Running { shutdown_tx, task });
        true
    }

    /// Stop the generator and wait for its task to exit.
    ///
    /// Returns `false` if it was not running.
    pub async fn stop(&self) -> bool {
        let Some(running) = self.running.lock().take() else {
            debug!(instrument = %self.instrument.id(), "Generator not running");
            return false;
        };
        let _ = running.shutdown_tx.send(true);
        if let Err(e) = running.task.await {
            warn!(instrument = %self.instrument.id(), error = %e, "Generator task ended abnormally");
        }
        info!(instrument = %self.instrument.id(), "Price generator stopped");
        true
    }
}

/// State owned by the spawned generator task.
struct Walk {
    instrument: Instrument,
    price: f64,
    rng: StdRng,
    store: Arc<dyn PriceStore>,
    market_tx: broadcast::Sender<MarketEvent>,
    ticks: mpsc::UnboundedSender<PriceTick>,
    clock: Arc<dyn Clock>,
}

impl Walk {
    async fn run(mut self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let model = *self.instrument.model();
        self.price = self
            .instrument
            .round_price(self.price)
            .clamp(model.min_price, model.max_price);
        self.emit();

        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    self.price = next_price(&self.instrument, self.price, &mut self.rng);
                    self.emit();
                }
            }
        }
    }

    fn emit(&self) {
        let tick = PriceTick::new(self.instrument.id().clone(), self.price, self.clock.now());

        // A failed write is reconciled by the next successful one.
        if let Err(e) = self.store.put(&tick) {
            warn!(instrument = %tick.instrument, error = %e, "Failed to store price tick");
        }

        trace!(instrument = %tick.instrument, price = tick.price, "Tick");
        let _ = self.market_tx.send(MarketEvent::PriceUpdated(tick.clone()));
        let _ = self.ticks.send(tick);
    }
}
