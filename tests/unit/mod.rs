mod engine_tests;
mod scenario_tests;

use matchbook_rs::prelude::*;

/// A limit order request for `symbol`.
pub fn limit_request(symbol: &str, side: Side, price: f64, quantity: f64) -> OrderRequest {
    OrderRequest {
        symbol: symbol.to_string(),
        order_type: OrderKind::Limit,
        side,
        quantity,
        price: Some(price),
    }
}

/// A market order request for `symbol`.
pub fn market_request(symbol: &str, side: Side, quantity: f64) -> OrderRequest {
    OrderRequest {
        symbol: symbol.to_string(),
        order_type: OrderKind::Market,
        side,
        quantity,
        price: None,
    }
}

/// Canonical price at the default 2 decimals.
pub fn px(value: f64) -> Price {
    Price::canonical(value, 2).expect("valid test price")
}

/// Canonical quantity.
pub fn qty(value: f64) -> Quantity {
    Quantity::canonical(value).expect("valid test quantity")
}
