use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use oddsfeed::application::broadcast::{BroadcastSettings, Broadcaster, OutboundMessage};
use oddsfeed::application::event::{EventBus, MarketEvent, TradeEvent};
use oddsfeed::domain::{Candle, InstrumentId, PriceTick, Timeframe, UserId};
use oddsfeed::port::SystemClock;
use oddsfeed::testkit::domain::open_trade;
use tokio::sync::mpsc;

fn setup(server_time: Duration) -> (Arc<EventBus>, Arc<Broadcaster>) {
    let bus = Arc::new(EventBus::new(
        &[InstrumentId::from("BTCUSD"), InstrumentId::from("EURUSD")],
        64,
    ));
    let hub = Arc::new(Broadcaster::new(
        BroadcastSettings {
            client_queue: 16,
            server_time_interval: server_time,
        },
        bus.clone(),
        Arc::new(SystemClock),
    ));
    (bus, hub)
}

/// Next message that is not a server-time heartbeat.
async fn next_event(rx: &mut mpsc::Receiver<OutboundMessage>) -> Option<OutboundMessage> {
    loop {
        match tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
            Ok(Some(OutboundMessage::ServerTime { .. })) => continue,
            Ok(other) => return other,
            Err(_) => return None,
        }
    }
}

fn tick(instrument: &str, price: f64) -> MarketEvent {
    MarketEvent::PriceUpdated(PriceTick::new(InstrumentId::from(instrument), price, Utc::now()))
}

#[tokio::test]
async fn price_updates_reach_only_instrument_subscribers() {
    let (bus, hub) = setup(Duration::from_secs(3_600));
    let handle = hub.start().unwrap();

    let (alice, mut alice_rx) = hub.connect(None);
    let (bob, mut bob_rx) = hub.connect(None);
    hub.subscribe(alice, InstrumentId::from("BTCUSD"), Timeframe::FIVE_SECONDS);
    hub.subscribe(bob, InstrumentId::from("EURUSD"), Timeframe::FIVE_SECONDS);

    bus.publish_market(tick("BTCUSD", 50_000.0));

    match next_event(&mut alice_rx).await {
        Some(OutboundMessage::PriceUpdate(t)) => assert_eq!(t.price, 50_000.0),
        other => panic!("expected price update, got {other:?}"),
    }
    assert!(next_event(&mut bob_rx).await.is_none());

    handle.shutdown().await;
}

#[tokio::test]
async fn candle_events_follow_the_subscribed_timeframe() {
    let (bus, hub) = setup(Duration::from_secs(3_600));
    let handle = hub.start().unwrap();
    let btc = InstrumentId::from("BTCUSD");
    let one_minute = Timeframe::ONE_MINUTE;

    let (client, mut rx) = hub.connect(None);
    hub.subscribe(client, btc.clone(), Timeframe::FIVE_SECONDS);

    let candle = Candle::open_at(btc.clone(), one_minute, 50_000.0, Utc::now());
    bus.publish_market(MarketEvent::CandleUpdated(candle.clone()));
    assert!(next_event(&mut rx).await.is_none());

    hub.subscribe(client, btc.clone(), one_minute);
    bus.publish_market(MarketEvent::CandleClosed(candle));
    match next_event(&mut rx).await {
        Some(OutboundMessage::CandleClose(c)) => assert_eq!(c.timeframe, one_minute),
        other => panic!("expected candle close, got {other:?}"),
    }

    hub.unsubscribe(client, &btc, one_minute);
    hub.unsubscribe(client, &btc, Timeframe::FIVE_SECONDS);
    bus.publish_market(tick("BTCUSD", 50_001.0));
    assert!(next_event(&mut rx).await.is_none());

    handle.shutdown().await;
}

#[tokio::test]
async fn trade_events_go_to_the_owner_only() {
    let (bus, hub) = setup(Duration::from_secs(3_600));
    let handle = hub.start().unwrap();

    let (_alice, mut alice_rx) = hub.connect(Some(UserId::from("alice")));
    let (bob, mut bob_rx) = hub.connect(None);
    hub.bind_user(bob, UserId::from("bob"));

    let trade = open_trade("t-9", "alice", Utc::now(), 30);
    bus.publish_trade(TradeEvent::Opened(trade.clone()));
    bus.publish_trade(TradeEvent::Countdown {
        trade_id: trade.id.clone(),
        user_id: trade.user_id.clone(),
        instrument: trade.instrument.clone(),
        seconds: 29,
    });

    assert!(matches!(
        next_event(&mut alice_rx).await,
        Some(OutboundMessage::TradeOpen(_))
    ));
    match next_event(&mut alice_rx).await {
        Some(OutboundMessage::TradeCountdown { seconds, .. }) => assert_eq!(seconds, 29),
        other => panic!("expected countdown, got {other:?}"),
    }
    assert!(next_event(&mut bob_rx).await.is_none());

    handle.shutdown().await;
}

#[tokio::test]
async fn server_time_reaches_every_client() {
    let (_bus, hub) = setup(Duration::from_millis(20));
    let (_a, mut a_rx) = hub.connect(None);
    let (_b, mut b_rx) = hub.connect(Some(UserId::from("bob")));
    let handle = hub.start().unwrap();

    for rx in [&mut a_rx, &mut b_rx] {
        let msg = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("server time within a second")
            .expect("queue open");
        assert_eq!(msg.kind(), "server:time");
    }

    handle.shutdown().await;
}

#[tokio::test]
async fn disconnected_clients_are_pruned() {
    let (bus, hub) = setup(Duration::from_secs(3_600));
    let handle = hub.start().unwrap();

    let (client, rx) = hub.connect(None);
    hub.subscribe(client, InstrumentId::from("BTCUSD"), Timeframe::FIVE_SECONDS);
    drop(rx);

    bus.publish_market(tick("BTCUSD", 50_000.0));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(hub.client_count(), 0);
    assert!(!hub.disconnect(client));
    handle.shutdown().await;
}
