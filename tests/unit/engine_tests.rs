//! Engine facade behaviour: validation, cancellation, queries, and the
//! push channels.

use crate::{limit_request, market_request, px, qty};
use matchbook_rs::prelude::*;
use tokio::sync::broadcast::error::TryRecvError;

const SYMBOL: &str = "ETH-USDT";

#[test]
fn rejects_non_positive_quantity() {
    let engine = MatchingEngine::new();
    let response = engine.process(limit_request(SYMBOL, Side::Buy, 100.0, 0.0));
    assert_eq!(response.status, ResponseStatus::Rejected);
    assert!(response.reason.unwrap().contains("positive"));

    let response = engine.process(limit_request(SYMBOL, Side::Buy, 100.0, -1.0));
    assert_eq!(response.status, ResponseStatus::Rejected);

    // No book was touched.
    assert!(engine.symbols().is_empty() || engine.depth(SYMBOL, None).bids.is_empty());
}

#[test]
fn rejects_priced_kinds_without_price() {
    let engine = MatchingEngine::new();
    for order_type in [OrderKind::Limit, OrderKind::Ioc, OrderKind::Fok] {
        let response = engine.process(OrderRequest {
            symbol: SYMBOL.to_string(),
            order_type,
            side: Side::Buy,
            quantity: 1.0,
            price: None,
        });
        assert_eq!(response.status, ResponseStatus::Rejected);
        assert!(response.reason.unwrap().contains("price required"));
    }
}

#[test]
fn rejects_non_finite_price() {
    let engine = MatchingEngine::new();
    let response = engine.process(limit_request(SYMBOL, Side::Buy, f64::NAN, 1.0));
    assert_eq!(response.status, ResponseStatus::Rejected);
}

#[test]
fn unknown_order_type_fails_at_the_serde_boundary() {
    let raw = r#"{"symbol":"ETH-USDT","order_type":"pegged","side":"buy","quantity":1.0}"#;
    assert!(serde_json::from_str::<OrderRequest>(raw).is_err());

    let raw = r#"{"symbol":"ETH-USDT","order_type":"limit","side":"buy","quantity":1.0,"price":100.0}"#;
    let request: OrderRequest = serde_json::from_str(raw).unwrap();
    assert_eq!(request.order_type, OrderKind::Limit);
}

#[test]
fn market_order_ignores_supplied_price() {
    let engine = MatchingEngine::new();
    engine.process(limit_request(SYMBOL, Side::Sell, 100.0, 1.0));

    let response = engine.process(OrderRequest {
        symbol: SYMBOL.to_string(),
        order_type: OrderKind::Market,
        side: Side::Buy,
        quantity: 1.0,
        price: Some(50.0),
    });
    assert_eq!(response.status, ResponseStatus::Accepted);
    assert_eq!(response.trades, 1);
}

#[test]
fn unknown_symbol_queries_are_empty() {
    let engine = MatchingEngine::new();

    let quote = engine.bbo("NOPE-USD");
    assert_eq!(quote.bid, None);
    assert_eq!(quote.ask, None);

    let depth = engine.depth("NOPE-USD", None);
    assert!(depth.bids.is_empty() && depth.asks.is_empty());

    assert!(engine.recent_trades("NOPE-USD", 10).is_empty());
    assert!(engine.order_status("NOPE-USD", OrderId::new()).is_none());
    assert!(!engine.cancel("NOPE-USD", OrderId::new()));
}

#[test]
fn cancel_resting_order() {
    let engine = MatchingEngine::new();
    let response = engine.process(limit_request(SYMBOL, Side::Buy, 100.0, 1.0));

    assert!(engine.cancel(SYMBOL, response.order_id));
    assert!(engine.order_status(SYMBOL, response.order_id).is_none());
    assert_eq!(engine.bbo(SYMBOL).bid, None);

    // Second cancel is a no-op.
    assert!(!engine.cancel(SYMBOL, response.order_id));
}

#[test]
fn cancel_pending_conditional() {
    let engine = MatchingEngine::new();
    let response = engine.submit_conditional(StopOrderRequest {
        order: market_request(SYMBOL, Side::Sell, 1.0),
        trigger_price: 99.0,
        trigger_type: TriggerKind::StopLoss,
    });
    assert_eq!(response.status, ResponseStatus::Queued);

    assert!(engine.cancel(SYMBOL, response.order_id));
    assert_eq!(engine.pending_stop_count(), 0);
    assert!(!engine.cancel(SYMBOL, response.order_id));
}

#[test]
fn conditional_requires_market_or_limit() {
    let engine = MatchingEngine::new();
    let response = engine.submit_conditional(StopOrderRequest {
        order: OrderRequest {
            symbol: SYMBOL.to_string(),
            order_type: OrderKind::Fok,
            side: Side::Sell,
            quantity: 1.0,
            price: Some(99.0),
        },
        trigger_price: 99.0,
        trigger_type: TriggerKind::StopLoss,
    });
    assert_eq!(response.status, ResponseStatus::Rejected);
    assert!(response.reason.unwrap().contains("market or limit"));
}

#[test]
fn conditional_rejects_bad_trigger_price() {
    let engine = MatchingEngine::new();
    let response = engine.submit_conditional(StopOrderRequest {
        order: market_request(SYMBOL, Side::Sell, 1.0),
        trigger_price: f64::NAN,
        trigger_type: TriggerKind::StopLoss,
    });
    assert_eq!(response.status, ResponseStatus::Rejected);
}

#[test]
fn order_status_reports_lifecycle() {
    let engine = MatchingEngine::new();
    let resting = engine.process(limit_request(SYMBOL, Side::Sell, 100.0, 2.0));
    let order = engine.order_status(SYMBOL, resting.order_id).unwrap();
    assert_eq!(order.status(), OrderStatus::New);

    engine.process(limit_request(SYMBOL, Side::Buy, 100.0, 1.0));
    let order = engine.order_status(SYMBOL, resting.order_id).unwrap();
    assert_eq!(order.status(), OrderStatus::Partial);
    assert_eq!(order.remaining(), qty(1.0));

    engine.process(limit_request(SYMBOL, Side::Buy, 100.0, 1.0));
    assert!(engine.order_status(SYMBOL, resting.order_id).is_none());
}

#[test]
fn market_data_snapshots_follow_book_changes() {
    let engine = MatchingEngine::new();
    let mut market_data = engine.subscribe_market_data();

    engine.process(limit_request(SYMBOL, Side::Sell, 100.0, 1.0));
    match market_data.try_recv().unwrap() {
        MarketDataMessage::Snapshot(snapshot) => {
            assert_eq!(snapshot.symbol, SYMBOL);
            assert_eq!(snapshot.asks, vec![(px(100.0), qty(1.0))]);
            assert!(snapshot.bids.is_empty());
        }
        other => panic!("expected snapshot, got {other:?}"),
    }

    // A market order that matches nothing does not alter the book.
    engine.process(market_request(SYMBOL, Side::Sell, 1.0));
    assert!(matches!(market_data.try_recv(), Err(TryRecvError::Empty)));

    // A cancel that removes a resting order does.
    let bid = engine.process(limit_request(SYMBOL, Side::Buy, 99.0, 1.0));
    let _ = market_data.try_recv().unwrap();
    assert!(engine.cancel(SYMBOL, bid.order_id));
    match market_data.try_recv().unwrap() {
        MarketDataMessage::Snapshot(snapshot) => assert!(snapshot.bids.is_empty()),
        other => panic!("expected snapshot, got {other:?}"),
    }
}

#[test]
fn trade_stream_delivers_trades_in_order() {
    let engine = MatchingEngine::new();
    let mut trades = engine.subscribe_trades();

    engine.process(limit_request(SYMBOL, Side::Sell, 100.0, 1.0));
    engine.process(limit_request(SYMBOL, Side::Sell, 101.0, 1.0));
    engine.process(market_request(SYMBOL, Side::Buy, 2.0));

    let first = trades.try_recv().unwrap();
    let second = trades.try_recv().unwrap();
    assert_eq!(first.price, px(100.0));
    assert_eq!(second.price, px(101.0));
    assert!(matches!(trades.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(flavor = "multi_thread")]
async fn heartbeats_flow_while_the_book_is_quiet() {
    let config = EngineConfig {
        heartbeat_interval_ms: 20,
        ..EngineConfig::default()
    };
    let engine = std::sync::Arc::new(MatchingEngine::with_config(config));
    let mut market_data = engine.subscribe_market_data();

    let heartbeat = engine.spawn_heartbeat();
    tokio::time::sleep(std::time::Duration::from_millis(120)).await;
    heartbeat.abort();

    let mut saw_heartbeat = false;
    while let Ok(message) = market_data.try_recv() {
        if matches!(message, MarketDataMessage::Heartbeat { .. }) {
            saw_heartbeat = true;
        }
    }
    assert!(saw_heartbeat);
}

#[test]
fn engine_status_summarises_state() {
    let engine = MatchingEngine::new();
    engine.process(limit_request("AAA-USD", Side::Buy, 1.0, 1.0));
    engine.process(limit_request("BBB-USD", Side::Buy, 1.0, 1.0));
    engine.submit_conditional(StopOrderRequest {
        order: market_request("AAA-USD", Side::Sell, 1.0),
        trigger_price: 0.5,
        trigger_type: TriggerKind::StopLoss,
    });

    let status = engine.status();
    assert_eq!(status.symbols.len(), 2);
    assert_eq!(status.total_trades, 0);
    assert_eq!(status.pending_stops, 1);
}

#[test]
fn writes_to_different_symbols_are_independent() {
    let engine = MatchingEngine::new();
    engine.process(limit_request("AAA-USD", Side::Sell, 10.0, 1.0));
    engine.process(limit_request("BBB-USD", Side::Sell, 20.0, 1.0));

    engine.process(market_request("AAA-USD", Side::Buy, 1.0));
    assert!(engine.depth("AAA-USD", None).asks.is_empty());
    assert_eq!(engine.depth("BBB-USD", None).asks, vec![(px(20.0), qty(1.0))]);
}
