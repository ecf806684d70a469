//! Client registry and event routing.
//!
//! Each client owns a bounded queue. Delivery never waits: a full queue
//! drops the client from the event type that overflowed it (the instrument's
//! price updates, one candle timeframe, or its user's trade events), and a
//! closed queue removes the client entirely. One forwarding task per instrument
//! channel and one for the trade channel keep per-channel order intact.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::message::OutboundMessage;
use crate::application::event::{EventBus, MarketEvent, TradeEvent};
use crate::domain::{ClientId, InstrumentId, Timeframe, UserId};
use crate::port::Clock;

struct Client {
    user: Option<UserId>,
    tx: mpsc::Sender<OutboundMessage>,
    candles: HashSet<(InstrumentId, Timeframe)>,
    prices: HashSet<InstrumentId>,
}

impl Client {
    fn wants(&self, event: &MarketEvent) -> bool {
        match event {
            MarketEvent::PriceUpdated(tick) => self.prices.contains(&tick.instrument),
            MarketEvent::CandleUpdated(candle) | MarketEvent::CandleClosed(candle) => self
                .candles
                .contains(&(candle.instrument.clone(), candle.timeframe)),
        }
    }

    /// Stop sending the kind of market event that overflowed the queue.
    fn drop_stream(&mut self, event: &MarketEvent) {
        match event {
            MarketEvent::PriceUpdated(tick) => {
                self.prices.remove(&tick.instrument);
            }
            MarketEvent::CandleUpdated(candle) | MarketEvent::CandleClosed(candle) => {
                self.candles
                    .remove(&(candle.instrument.clone(), candle.timeframe));
            }
        }
    }
}

enum Failure {
    Full(ClientId),
    Closed(ClientId),
}

/// Broadcast tuning.
#[derive(Debug, Clone)]
pub struct BroadcastSettings {
    /// Per-client queue capacity.
    pub client_queue: usize,
    pub server_time_interval: Duration,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            client_queue: 256,
            server_time_interval: Duration::from_secs(1),
        }
    }
}

/// Routes bus events to connected clients.
pub struct Broadcaster {
    settings: BroadcastSettings,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    clients: RwLock<HashMap<ClientId, Client>>,
    next_id: AtomicU64,
    running: Arc<AtomicBool>,
}

impl Broadcaster {
    pub fn new(settings: BroadcastSettings, bus: Arc<EventBus>, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            bus,
            clock,
            clients: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register a client and return its id and message queue.
    pub fn connect(&self, user: Option<UserId>) -> (ClientId, mpsc::Receiver<OutboundMessage>) {
        let id = ClientId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.settings.client_queue.max(1));
        self.clients.write().insert(
            id,
            Client {
                user,
                tx,
                candles: HashSet::new(),
                prices: HashSet::new(),
            },
        );
        debug!(client = %id, "Client connected");
        (id, rx)
    }

    /// Remove a client. Returns `false` if it was unknown.
    pub fn disconnect(&self, id: ClientId) -> bool {
        let removed = self.clients.write().remove(&id).is_some();
        if removed {
            debug!(client = %id, "Client disconnected");
        }
        removed
    }

    /// Subscribe a client to an instrument's candles at `timeframe`; price
    /// updates for the instrument come with any subscription.
    pub fn subscribe(&self, id: ClientId, instrument: InstrumentId, timeframe: Timeframe) -> bool {
        match self.clients.write().get_mut(&id) {
            Some(client) => {
                client.prices.insert(instrument.clone());
                client.candles.insert((instrument, timeframe));
                true
            }
            None => false,
        }
    }

    /// Drop one candle subscription. Price updates stop once the client has
    /// no timeframe left for the instrument.
    pub fn unsubscribe(&self, id: ClientId, instrument: &InstrumentId, timeframe: Timeframe) -> bool {
        let mut clients = self.clients.write();
        let Some(client) = clients.get_mut(&id) else {
            return false;
        };
        let removed = client.candles.remove(&(instrument.clone(), timeframe));
        if !client.candles.iter().any(|(i, _)| i == instrument) {
            client.prices.remove(instrument);
        }
        removed
    }

    /// Associate a client with a user so it receives that user's trade events.
    pub fn bind_user(&self, id: ClientId, user: UserId) -> bool {
        match self.clients.write().get_mut(&id) {
            Some(client) => {
                client.user = Some(user);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Deliver a market event to subscribed clients. Returns the number of
    /// clients it was queued for.
    pub fn dispatch_market(&self, event: &MarketEvent) -> usize {
        let instrument = event.instrument().clone();
        let recipients: Vec<(ClientId, mpsc::Sender<OutboundMessage>)> = {
            let clients = self.clients.read();
            clients
                .iter()
                .filter(|(_, c)| c.wants(event))
                .map(|(id, c)| (*id, c.tx.clone()))
                .collect()
        };
        if recipients.is_empty() {
            return 0;
        }

        let message = OutboundMessage::from(event.clone());
        let (delivered, failures) = Self::deliver(&recipients, &message);

        if !failures.is_empty() {
            let mut clients = self.clients.write();
            for failure in failures {
                match failure {
                    Failure::Full(id) => {
                        if let Some(client) = clients.get_mut(&id) {
                            client.drop_stream(event);
                        }
                        warn!(
                            client = %id,
                            instrument = %instrument,
                            event = message.kind(),
                            "Client queue full, dropped subscription"
                        );
                    }
                    Failure::Closed(id) => {
                        clients.remove(&id);
                        debug!(client = %id, "Client queue closed, removed");
                    }
                }
            }
        }
        delivered
    }

    /// Deliver a trade event to the owning user's clients.
    pub fn dispatch_trade(&self, event: &TradeEvent) -> usize {
        let user = event.user_id();
        let recipients: Vec<(ClientId, mpsc::Sender<OutboundMessage>)> = self
            .clients
            .read()
            .iter()
            .filter(|(_, c)| c.user.as_ref() == Some(user))
            .map(|(id, c)| (*id, c.tx.clone()))
            .collect();
        if recipients.is_empty() {
            return 0;
        }

        let message = OutboundMessage::from(event.clone());
        let (delivered, failures) = Self::deliver(&recipients, &message);

        if !failures.is_empty() {
            let mut clients = self.clients.write();
            for failure in failures {
                match failure {
                    Failure::Full(id) => {
                        if let Some(client) = clients.get_mut(&id) {
                            client.user = None;
                        }
                        warn!(client = %id, user_id = %user, "Client queue full, dropped trade events");
                    }
                    Failure::Closed(id) => {
                        clients.remove(&id);
                        debug!(client = %id, "Client queue closed, removed");
                    }
                }
            }
        }
        delivered
    }

    /// Send `server:time` to every client.
    pub fn broadcast_server_time(&self) -> usize {
        let recipients: Vec<(ClientId, mpsc::Sender<OutboundMessage>)> = self
            .clients
            .read()
            .iter()
            .map(|(id, c)| (*id, c.tx.clone()))
            .collect();
        let message = OutboundMessage::ServerTime {
            timestamp: self.clock.now(),
        };
        let (delivered, failures) = Self::deliver(&recipients, &message);

        for failure in failures {
            match failure {
                Failure::Full(id) => debug!(client = %id, "Client queue full, skipped server time"),
                Failure::Closed(id) => {
                    self.clients.write().remove(&id);
                }
            }
        }
        delivered
    }

    fn deliver(
        recipients: &[(ClientId, mpsc::Sender<OutboundMessage>)],
        message: &OutboundMessage,
    ) -> (usize, Vec<Failure>) {
        let mut delivered = 0;
        let mut failures = Vec::new();
        for (id, tx) in recipients {
            match tx.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => failures.push(Failure::Full(*id)),
                Err(mpsc::error::TrySendError::Closed(_)) => failures.push(Failure::Closed(*id)),
            }
        }
        (delivered, failures)
    }

    /// Spawn the forwarding tasks and the server-time ticker.
    ///
    /// Bus receivers are created before this returns, so no event published
    /// afterwards is missed. Returns `None` if the broadcaster is already
    /// running; it can be started again once the handle is shut down.
    pub fn start(self: &Arc<Self>) -> Option<BroadcastHandle> {
        if self.running.swap(true, Ordering::AcqRel) {
            warn!("Broadcaster already running");
            return None;
        }
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        let instruments: Vec<InstrumentId> = self.bus.instruments().cloned().collect();
        for instrument in instruments {
            let Some(rx) = self.bus.subscribe_market(&instrument) else {
                continue;
            };
            let hub = Arc::clone(self);
            let shutdown = shutdown_rx.clone();
            tasks.push(tokio::spawn(async move {
                forward(rx, shutdown, instrument.to_string(), |event: MarketEvent| {
                    hub.dispatch_market(&event);
                })
                .await;
            }));
        }

        let trades = self.bus.subscribe_trades();
        let hub = Arc::clone(self);
        let shutdown = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move {
            forward(trades, shutdown, "trades".to_string(), |event: TradeEvent| {
                hub.dispatch_trade(&event);
            })
            .await;
        }));

        let hub = Arc::clone(self);
        let mut shutdown = shutdown_rx;
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(hub.settings.server_time_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {
                        hub.broadcast_server_time();
                    }
                }
            }
        }));

        info!(tasks = tasks.len(), "Broadcaster started");
        Some(BroadcastHandle {
            shutdown_tx,
            tasks,
            running: Arc::clone(&self.running),
        })
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

async fn forward<T: Clone>(
    mut rx: broadcast::Receiver<T>,
    mut shutdown: watch::Receiver<bool>,
    channel: String,
    mut dispatch: impl FnMut(T),
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            event = rx.recv() => match event {
                Ok(event) => dispatch(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(channel = %channel, skipped = n, "Broadcaster lagged, some events missed");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(channel = %channel, "Event channel closed");
                    break;
                }
            }
        }
    }
}

/// Handle for stopping the broadcaster's tasks.
pub struct BroadcastHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl BroadcastHandle {
    /// Signal shutdown and wait for every task to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Broadcast task ended abnormally");
            }
        }
        self.running.store(false, Ordering::Release);
        info!("Broadcaster stopped");
    }
}
