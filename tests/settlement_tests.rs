use oddsfeed::application::event::TradeEvent;
use oddsfeed::application::trade::{OpenTradeRequest, SettleOutcome};
use oddsfeed::domain::{AccountId, Direction, Trade, TradeStatus, TransactionKind, UserId};
use oddsfeed::error::{Error, LedgerError};
use oddsfeed::port::{Ledger, TradeStore};
use oddsfeed::testkit::harness::TradeHarness;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

async fn open(
    h: &TradeHarness,
    account: &AccountId,
    direction: Direction,
    amount: Decimal,
    secs: u64,
) -> Trade {
    h.service
        .open_trade(OpenTradeRequest {
            user_id: UserId::from("alice"),
            account_id: account.clone(),
            instrument: h.btc(),
            direction,
            amount,
            expiration_secs: secs,
        })
        .await
        .expect("open trade")
}

async fn results(h: &TradeHarness, account: &AccountId) -> Vec<Decimal> {
    h.ledger
        .transactions(account)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.kind == TransactionKind::TradeResult)
        .map(|t| t.amount)
        .collect()
}

#[tokio::test]
async fn call_win_credits_stake_plus_payout() {
    let h = TradeHarness::new();
    let account = h.fund("alice", dec!(100)).await;
    h.set_price(50_000.0);
    let trade = open(&h, &account, Direction::Call, dec!(100), 5).await;
    assert_eq!(h.ledger.balance(&account).await.unwrap(), dec!(0));

    h.clock.advance(chrono::Duration::seconds(5));
    h.set_price(50_100.0);
    let outcome = h.service.settle(&trade.id).await.unwrap();

    let SettleOutcome::Settled(closed) = outcome else {
        panic!("expected settlement, got {outcome:?}");
    };
    assert_eq!(closed.status, TradeStatus::Win);
    assert_eq!(closed.exit_price, Some(50_100.0));
    assert!(closed.closed_at.is_some());
    assert_eq!(results(&h, &account).await, vec![dec!(180)]);
    assert_eq!(h.ledger.balance(&account).await.unwrap(), dec!(180));
}

#[tokio::test]
async fn equal_prices_tie_and_return_the_stake() {
    let h = TradeHarness::new();
    let account = h.fund("alice", dec!(100)).await;
    h.set_price(50_000.0);
    let trade = open(&h, &account, Direction::Put, dec!(100), 5).await;

    h.clock.advance(chrono::Duration::seconds(6));
    let SettleOutcome::Settled(closed) = h.service.settle(&trade.id).await.unwrap() else {
        panic!("expected settlement");
    };

    assert_eq!(closed.status, TradeStatus::Tie);
    assert_eq!(h.ledger.balance(&account).await.unwrap(), dec!(100));
}

#[tokio::test]
async fn settling_twice_has_one_ledger_effect() {
    let h = TradeHarness::new();
    let account = h.fund("alice", dec!(100)).await;
    h.set_price(50_000.0);
    let trade = open(&h, &account, Direction::Call, dec!(100), 5).await;

    h.clock.advance(chrono::Duration::seconds(5));
    h.set_price(50_100.0);
    let SettleOutcome::Settled(first) = h.service.settle(&trade.id).await.unwrap() else {
        panic!("expected settlement");
    };

    h.set_price(40_000.0);
    let SettleOutcome::AlreadySettled(second) = h.service.settle(&trade.id).await.unwrap() else {
        panic!("expected no-op");
    };

    assert_eq!(first, second);
    assert_eq!(results(&h, &account).await.len(), 1);
    assert_eq!(h.ledger.balance(&account).await.unwrap(), dec!(180));
}

#[tokio::test]
async fn transient_ledger_failures_are_retried() {
    let h = TradeHarness::new();
    let account = h.fund("alice", dec!(100)).await;
    h.set_price(50_000.0);
    let trade = open(&h, &account, Direction::Call, dec!(100), 5).await;

    h.clock.advance(chrono::Duration::seconds(5));
    h.set_price(50_100.0);
    h.flaky.fail_next(2);
    let before = h.flaky.attempts();

    let outcome = h.service.settle(&trade.id).await.unwrap();

    assert!(matches!(outcome, SettleOutcome::Settled(_)));
    assert_eq!(h.flaky.attempts() - before, 3);
    assert_eq!(h.ledger.balance(&account).await.unwrap(), dec!(180));
}

#[tokio::test]
async fn exhausted_retries_leave_trade_open_with_fixed_outcome() {
    let h = TradeHarness::new();
    let account = h.fund("alice", dec!(100)).await;
    h.set_price(50_000.0);
    let trade = open(&h, &account, Direction::Call, dec!(100), 5).await;

    h.clock.advance(chrono::Duration::seconds(5));
    h.set_price(50_100.0);
    h.flaky.fail_next(3);

    let err = h.service.settle(&trade.id).await.unwrap_err();
    assert!(matches!(err, Error::Ledger(LedgerError::Unavailable(_))));
    let stored = h.trades.find_by_id(&trade.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TradeStatus::Open);
    assert_eq!(h.ledger.balance(&account).await.unwrap(), dec!(0));

    // The price moves against the trade before the retry; the decided
    // outcome stays.
    h.set_price(49_000.0);
    let SettleOutcome::Settled(closed) = h.service.settle(&trade.id).await.unwrap() else {
        panic!("expected settlement on retry");
    };
    assert_eq!(closed.status, TradeStatus::Win);
    assert_eq!(closed.exit_price, Some(50_100.0));
    assert_eq!(h.ledger.balance(&account).await.unwrap(), dec!(180));
}

#[tokio::test]
async fn concurrent_settle_reports_in_progress() {
    let h = TradeHarness::new();
    let account = h.fund("alice", dec!(100)).await;
    h.set_price(50_000.0);
    let trade = open(&h, &account, Direction::Call, dec!(100), 5).await;

    h.clock.advance(chrono::Duration::seconds(5));
    h.set_price(50_100.0);
    // First writer backs off after one failure while holding its claim.
    h.flaky.fail_next(1);

    let (a, b) = tokio::join!(h.service.settle(&trade.id), h.service.settle(&trade.id));

    assert!(matches!(a.unwrap(), SettleOutcome::Settled(_)));
    assert!(matches!(b.unwrap(), SettleOutcome::InProgress));
    assert_eq!(results(&h, &account).await.len(), 1);
}

#[tokio::test]
async fn sweep_settles_only_expired_trades_and_emits_close() {
    let h = TradeHarness::new();
    let account = h.fund("alice", dec!(300)).await;
    h.set_price(50_000.0);
    let short = open(&h, &account, Direction::Put, dec!(100), 5).await;
    let long = open(&h, &account, Direction::Put, dec!(100), 60).await;
    let mut events = h.bus.subscribe_trades();

    h.clock.advance(chrono::Duration::seconds(10));
    h.set_price(49_500.0);
    let settled = h.service.settle_expired().await.unwrap();

    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].id, short.id);
    match events.recv().await.unwrap() {
        TradeEvent::Closed(closed) => assert_eq!(closed.status, TradeStatus::Win),
        other => panic!("expected trade close, got {other:?}"),
    }

    let open_now = h.service.open_trades().await.unwrap();
    assert_eq!(open_now.len(), 1);
    assert_eq!(open_now[0].id, long.id);
    // 300 - 200 staked + 180 won
    assert_eq!(h.ledger.balance(&account).await.unwrap(), dec!(280));
}

#[tokio::test]
async fn balance_equals_sum_of_entries() {
    let h = TradeHarness::new();
    let account = h.fund("alice", dec!(500)).await;
    h.set_price(50_000.0);
    for (direction, exit) in [
        (Direction::Call, 50_010.0),
        (Direction::Put, 50_010.0),
        (Direction::Call, 50_000.0),
    ] {
        let trade = open(&h, &account, direction, dec!(50), 5).await;
        h.clock.advance(chrono::Duration::seconds(5));
        h.set_price(exit);
        h.service.settle(&trade.id).await.unwrap();
        h.set_price(50_000.0);
    }

    let sum: Decimal = h
        .ledger
        .transactions(&account)
        .await
        .unwrap()
        .iter()
        .map(|t| t.amount)
        .sum();
    let row = h.ledger.account(&account).await.unwrap().unwrap();

    assert_eq!(h.ledger.balance(&account).await.unwrap(), sum);
    assert_eq!(row.balance, sum);
    // +500, win (+40 net), loss (-50), tie (0)
    assert_eq!(sum, dec!(490));
}
