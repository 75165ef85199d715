//! End-to-end scenarios through the engine facade.

use crate::{limit_request, market_request, px, qty};
use matchbook_rs::prelude::*;

const SYMBOL: &str = "BTC-USDT";

#[test]
fn exact_crossing_empties_book() {
    let engine = MatchingEngine::new();
    let sell = engine.process(limit_request(SYMBOL, Side::Sell, 100.0, 1.0));
    assert_eq!(sell.status, ResponseStatus::Accepted);
    assert_eq!(sell.trades, 0);

    let buy = engine.process(limit_request(SYMBOL, Side::Buy, 100.0, 1.0));
    assert_eq!(buy.status, ResponseStatus::Accepted);
    assert_eq!(buy.trades, 1);

    let trades = engine.recent_trades(SYMBOL, 10);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].price, px(100.0));
    assert_eq!(trades[0].quantity, qty(1.0));
    assert_eq!(trades[0].aggressor_side, Side::Buy);

    let quote = engine.bbo(SYMBOL);
    assert_eq!(quote.bid, None);
    assert_eq!(quote.ask, None);
}

#[test]
fn partial_fill_rests_residual() {
    let engine = MatchingEngine::new();
    engine.process(limit_request(SYMBOL, Side::Sell, 100.0, 2.0));
    let buy = engine.process(limit_request(SYMBOL, Side::Buy, 100.0, 3.0));
    assert_eq!(buy.trades, 1);

    let trades = engine.recent_trades(SYMBOL, 10);
    assert_eq!(trades[0].quantity, qty(2.0));

    let depth = engine.depth(SYMBOL, None);
    assert!(depth.asks.is_empty());
    assert_eq!(depth.bids, vec![(px(100.0), qty(1.0))]);

    let resting = engine
        .order_status(SYMBOL, buy.order_id)
        .expect("residual resting");
    assert_eq!(resting.status(), OrderStatus::Partial);
    assert_eq!(resting.remaining(), qty(1.0));
}

#[test]
fn price_time_priority_favours_earlier_arrival() {
    let engine = MatchingEngine::new();
    let first = engine.process(limit_request(SYMBOL, Side::Sell, 100.0, 1.0));
    let second = engine.process(limit_request(SYMBOL, Side::Sell, 100.0, 1.0));

    let buy = engine.process(limit_request(SYMBOL, Side::Buy, 100.0, 1.0));
    assert_eq!(buy.trades, 1);

    let trades = engine.recent_trades(SYMBOL, 1);
    assert_eq!(trades[0].maker_order_id, first.order_id);

    // The later seller still rests.
    assert!(engine.order_status(SYMBOL, second.order_id).is_some());
    assert!(engine.order_status(SYMBOL, first.order_id).is_none());
    assert_eq!(engine.depth(SYMBOL, None).asks, vec![(px(100.0), qty(1.0))]);
}

#[test]
fn market_order_sweeps_levels() {
    let engine = MatchingEngine::new();
    engine.process(limit_request(SYMBOL, Side::Sell, 100.0, 1.0));
    engine.process(limit_request(SYMBOL, Side::Sell, 101.0, 1.0));
    engine.process(limit_request(SYMBOL, Side::Sell, 102.0, 1.0));

    let buy = engine.process(market_request(SYMBOL, Side::Buy, 2.5));
    assert_eq!(buy.trades, 3);

    // Newest first.
    let trades = engine.recent_trades(SYMBOL, 10);
    assert_eq!(
        trades
            .iter()
            .map(|t| (t.price, t.quantity))
            .collect::<Vec<_>>(),
        vec![
            (px(102.0), qty(0.5)),
            (px(101.0), qty(1.0)),
            (px(100.0), qty(1.0)),
        ]
    );

    let depth = engine.depth(SYMBOL, None);
    assert_eq!(depth.asks, vec![(px(102.0), qty(0.5))]);
    assert!(engine.order_status(SYMBOL, buy.order_id).is_none());
}

#[test]
fn fok_failure_is_inert() {
    let engine = MatchingEngine::new();
    engine.process(limit_request(SYMBOL, Side::Sell, 100.0, 1.0));

    let fok = engine.process(OrderRequest {
        symbol: SYMBOL.to_string(),
        order_type: OrderKind::Fok,
        side: Side::Buy,
        quantity: 2.0,
        price: Some(100.0),
    });

    assert_eq!(fok.status, ResponseStatus::Rejected);
    assert_eq!(fok.trades, 0);
    assert!(fok.reason.is_some());
    assert_eq!(engine.depth(SYMBOL, None).asks, vec![(px(100.0), qty(1.0))]);
    assert!(engine.recent_trades(SYMBOL, 10).is_empty());
}

#[test]
fn ioc_partial_discards_residual() {
    let engine = MatchingEngine::new();
    engine.process(limit_request(SYMBOL, Side::Sell, 100.0, 1.0));

    let ioc = engine.process(OrderRequest {
        symbol: SYMBOL.to_string(),
        order_type: OrderKind::Ioc,
        side: Side::Buy,
        quantity: 2.0,
        price: Some(100.0),
    });

    assert_eq!(ioc.status, ResponseStatus::Accepted);
    assert_eq!(ioc.trades, 1);
    assert!(engine.depth(SYMBOL, None).asks.is_empty());
    assert!(engine.order_status(SYMBOL, ioc.order_id).is_none());
}

#[test]
fn stop_loss_promotes_and_executes() {
    let engine = MatchingEngine::new();
    engine.process(limit_request(SYMBOL, Side::Buy, 98.5, 1.0));

    let stop = engine.submit_conditional(StopOrderRequest {
        order: market_request(SYMBOL, Side::Sell, 1.0),
        trigger_price: 99.0,
        trigger_type: TriggerKind::StopLoss,
    });
    assert_eq!(stop.status, ResponseStatus::Queued);
    assert_eq!(engine.pending_stop_count(), 1);

    // bid 98.50 <= trigger 99.00, so the next sweep fires it.
    engine.sweep_stops();

    assert_eq!(engine.pending_stop_count(), 0);
    let trades = engine.recent_trades(SYMBOL, 10);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].price, px(98.5));
    assert_eq!(trades[0].quantity, qty(1.0));
    assert_eq!(trades[0].aggressor_side, Side::Sell);
    assert!(engine.bbo(SYMBOL).bid.is_none());
    // The queued identifier was retired on promotion.
    assert!(engine.order_status(SYMBOL, stop.order_id).is_none());
}
