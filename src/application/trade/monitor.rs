//! Settlement and countdown timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::countdown::CountdownTracker;
use super::service::TradeService;
use crate::application::event::EventBus;

/// Handle for stopping a running [`TradeMonitor`].
pub struct TradeMonitorHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TradeMonitorHandle {
    /// Signal shutdown and wait for the current pass to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Trade monitor task ended abnormally");
        }
    }
}

/// Periodic pass that settles expired trades and then emits countdowns for
/// the trades still open.
pub struct TradeMonitor {
    service: Arc<TradeService>,
    bus: Arc<EventBus>,
    interval: Duration,
    tracker: CountdownTracker,
}

impl TradeMonitor {
    pub fn new(service: Arc<TradeService>, bus: Arc<EventBus>, interval: Duration) -> Self {
        Self {
            service,
            bus,
            interval,
            tracker: CountdownTracker::new(),
        }
    }

    /// One settlement sweep followed by one round of countdowns.
    ///
    /// Returns the number of trades settled.
    pub async fn run_once(&mut self) -> usize {
        let settled = match self.service.settle_expired().await {
            Ok(settled) => settled.len(),
            Err(e) => {
                warn!(error = %e, "Settlement sweep failed");
                0
            }
        };

        match self.service.open_trades().await {
            Ok(open) => {
                let now = self.service.clock().now();
                for event in self.tracker.tick(&open, now) {
                    self.bus.publish_trade(event);
                }
            }
            Err(e) => warn!(error = %e, "Failed to load open trades for countdown"),
        }

        settled
    }

    /// Spawn the timer loop.
    ///
    /// Shutdown is only observed between passes, so an in-flight
    /// settlement always completes.
    pub fn start(mut self) -> TradeMonitorHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval_ms = self.interval.as_millis() as u64, "Trade monitor started");

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        let settled = self.run_once().await;
                        if settled > 0 {
                            debug!(settled, "Trade monitor pass");
                        }
                    }
                }
            }
            info!("Trade monitor stopped");
        });

        TradeMonitorHandle { shutdown_tx, task }
    }
}
