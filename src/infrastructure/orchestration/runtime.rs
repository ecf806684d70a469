//! Orchestrator runtime lifecycle.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::orchestrator::Orchestrator;
use crate::application::broadcast::BroadcastHandle;
use crate::application::trade::TradeMonitorHandle;
use crate::error::Result;
use crate::infrastructure::bootstrap::Services;
use crate::infrastructure::config::settings::Config;
use crate::port::{Clock, SystemClock};

impl Orchestrator {
    /// Run until Ctrl-C.
    pub async fn run(config: Config) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Interrupt received"),
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
            }
            let _ = shutdown_tx.send(true);
        });
        run_with_shutdown(config, shutdown_rx).await
    }

    /// Run with externally controlled shutdown signal.
    pub async fn run_with_shutdown(config: Config, shutdown: watch::Receiver<bool>) -> Result<()> {
        run_with_shutdown(config, shutdown).await
    }
}

/// The started system: services plus the handles needed to stop them.
pub struct RunningServices {
    pub services: Services,
    monitor: TradeMonitorHandle,
    broadcast: Option<BroadcastHandle>,
}

impl RunningServices {
    /// Build, seed and start everything.
    pub async fn start(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let services = Services::build(config, clock);
        let seeded = services.seed_accounts(config).await?;
        info!(accounts = seeded, "Accounts seeded");

        let broadcast = services.broadcaster.start();
        services.engine.start();
        let monitor = services.monitor(config).start();

        Ok(Self {
            services,
            monitor,
            broadcast,
        })
    }

    /// Stop in reverse order. An in-flight settlement sweep finishes first.
    pub async fn stop(self) {
        self.monitor.shutdown().await;
        if let Some(broadcast) = self.broadcast {
            broadcast.shutdown().await;
        }
        self.services.engine.stop().await;
    }
}

/// Runtime loop entrypoint used by [`Orchestrator`].
pub async fn run_with_shutdown(config: Config, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    info!(
        instruments = config.instruments.len(),
        tick_interval_ms = config.engine.tick_interval_ms,
        "Starting oddsfeed"
    );

    let running = RunningServices::start(&config, Arc::new(SystemClock)).await?;
    info!("Simulation running");

    loop {
        if *shutdown.borrow() {
            break;
        }
        if shutdown.changed().await.is_err() {
            warn!("Shutdown channel closed");
            break;
        }
    }

    info!("Shutdown signal received");
    running.stop().await;
    info!("Shutdown complete");
    Ok(())
}
