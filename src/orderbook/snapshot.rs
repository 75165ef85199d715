//! Serialisable views of book state: L2 depth and resting-order records.

use crate::orderbook::order::{Order, OrderId, OrderKind, Side};
use crate::orderbook::price::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Top-of-book depth: the best price levels per side with their aggregate
/// quantities, in priority order. Serialises as `[[price, quantity], …]`
/// pairs per side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    /// Bid levels, highest price first.
    pub bids: Vec<(Price, Quantity)>,
    /// Ask levels, lowest price first.
    pub asks: Vec<(Price, Quantity)>,
}

impl DepthSnapshot {
    /// Best bid level, if any.
    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids.first().copied()
    }

    /// Best ask level, if any.
    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks.first().copied()
    }

    /// True when both sides are empty.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// A resting order as persisted at shutdown and reloaded at startup.
///
/// `quantity` is the remaining quantity at snapshot time; reloading
/// re-submits the record through the engine as a fresh admission with the
/// same identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestingOrder {
    /// Preserved order identifier.
    pub id: OrderId,
    /// Symbol the order rests on.
    pub symbol: String,
    /// Buy or sell.
    pub side: Side,
    /// Execution semantics (always a resting-capable kind in practice).
    pub order_type: OrderKind,
    /// Limit price.
    pub price: Price,
    /// Remaining quantity at snapshot time.
    pub quantity: Quantity,
    /// Original admission timestamp, milliseconds since the epoch.
    pub timestamp: u64,
}

impl From<&Arc<Order>> for RestingOrder {
    fn from(order: &Arc<Order>) -> Self {
        Self {
            id: order.id,
            symbol: order.symbol.clone(),
            side: order.side,
            order_type: order.kind,
            price: order.price.unwrap_or(Price::ZERO),
            quantity: order.remaining(),
            timestamp: order.timestamp_ms,
        }
    }
}
