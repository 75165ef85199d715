//! Core order book: two sorted sides of price levels plus an order-id index.

use crate::orderbook::error::OrderBookError;
use crate::orderbook::level::PriceLevel;
use crate::orderbook::order::{Order, OrderId, OrderStatus, Side};
use crate::orderbook::price::{Price, Quantity};
use crate::orderbook::snapshot::{DepthSnapshot, RestingOrder};
use crossbeam::atomic::AtomicCell;
use crossbeam_skiplist::SkipMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// A per-symbol limit order book.
///
/// Both sides are concurrent ordered maps keyed by canonical price, so
/// best-price lookup and priority iteration come directly from the map
/// order: asks iterate forward (lowest first), bids iterate reversed
/// (highest first). The id index maps every live resting order to its
/// `Arc` handle, which carries its own price and side.
///
/// Reads are lock-free; writers are expected to be serialised per book by
/// the engine facade.
pub struct OrderBook {
    symbol: String,

    /// Bid side, iterated high-to-low for priority.
    pub(super) bids: SkipMap<Price, Arc<PriceLevel>>,

    /// Ask side, iterated low-to-high for priority.
    pub(super) asks: SkipMap<Price, Arc<PriceLevel>>,

    /// Order-id index over live resting orders.
    pub(super) orders: dashmap::DashMap<OrderId, Arc<Order>>,

    /// The last price at which a trade occurred.
    pub(super) last_trade_price: AtomicCell<Price>,

    /// Whether any trade has occurred on this book.
    pub(super) has_traded: AtomicBool,
}

impl OrderBook {
    /// Create an empty book for the given symbol.
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            bids: SkipMap::new(),
            asks: SkipMap::new(),
            orders: dashmap::DashMap::new(),
            last_trade_price: AtomicCell::new(Price::ZERO),
            has_traded: AtomicBool::new(false),
        }
    }

    /// The symbol of this book.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Rest an order in the book.
    ///
    /// Precondition per the book contract: a limit price and a positive
    /// remaining quantity. The matching core calls [`Self::rest`] directly
    /// after establishing both.
    pub fn insert(&self, order: Arc<Order>) -> Result<(), OrderBookError> {
        let Some(price) = order.price else {
            return Err(OrderBookError::MissingPrice);
        };
        if order.remaining().is_zero() {
            return Err(OrderBookError::ZeroQuantity);
        }
        self.rest(order, price);
        Ok(())
    }

    /// Append `order` to the side-appropriate level at `price`, creating the
    /// level if absent, and index it by id.
    pub(super) fn rest(&self, order: Arc<Order>, price: Price) {
        let side_map = match order.side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        let level = side_map
            .get_or_insert_with(price, || Arc::new(PriceLevel::new(price)))
            .value()
            .clone();
        level.add_order(order.clone());
        trace!(
            "book {}: rested {} {} {}@{}",
            self.symbol, order.side, order.id, order.quantity, price
        );
        self.orders.insert(order.id, order);
    }

    /// Cancel a resting order by id.
    ///
    /// Returns `false` when the id is unknown (already filled, cancelled,
    /// or never rested). Drops the price level if it becomes empty.
    pub fn cancel(&self, id: OrderId) -> bool {
        let Some((_, order)) = self.orders.remove(&id) else {
            return false;
        };
        // Resting orders always carry a price (market orders never rest).
        let Some(price) = order.price else {
            panic!("book {}: resting order {} has no price", self.symbol, id);
        };
        let side_map = match order.side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        if let Some(entry) = side_map.get(&price) {
            entry.value().remove_order(id);
            if entry.value().is_empty() {
                entry.remove();
            }
        }
        order.set_status(OrderStatus::Cancelled);
        trace!("book {}: cancelled {}", self.symbol, id);
        true
    }

    /// Look up a live resting order by id.
    pub fn order(&self, id: OrderId) -> Option<Arc<Order>> {
        self.orders.get(&id).map(|entry| entry.value().clone())
    }

    /// Number of live resting orders across both sides.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Best bid price, if any. Highest key on the bid side.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.iter().next_back().map(|entry| *entry.key())
    }

    /// Best ask price, if any. Lowest key on the ask side.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.iter().next().map(|entry| *entry.key())
    }

    /// Spread between best ask and best bid.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => {
                Some(Price::from_ticks(ask.ticks().saturating_sub(bid.ticks())))
            }
            _ => None,
        }
    }

    /// Mid price (average of best bid and best ask).
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.as_f64() + ask.as_f64()) / 2.0),
            _ => None,
        }
    }

    /// The last trade price, if any trade has occurred.
    pub fn last_trade_price(&self) -> Option<Price> {
        if self.has_traded.load(Ordering::Relaxed) {
            Some(self.last_trade_price.load())
        } else {
            None
        }
    }

    /// Top `levels` price levels per side in priority order, each as
    /// `(price, aggregate quantity)`. Empty sides yield empty vectors.
    pub fn depth(&self, levels: usize) -> DepthSnapshot {
        let bids = self
            .bids
            .iter()
            .rev()
            .filter(|entry| !entry.value().total_quantity().is_zero())
            .take(levels)
            .map(|entry| (*entry.key(), entry.value().total_quantity()))
            .collect();
        let asks = self
            .asks
            .iter()
            .filter(|entry| !entry.value().total_quantity().is_zero())
            .take(levels)
            .map(|entry| (*entry.key(), entry.value().total_quantity()))
            .collect();
        DepthSnapshot { bids, asks }
    }

    /// Total remaining quantity on one side.
    pub fn side_quantity(&self, side: Side) -> Quantity {
        let side_map = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        side_map
            .iter()
            .map(|entry| entry.value().total_quantity())
            .fold(Quantity::ZERO, Quantity::saturating_add)
    }

    /// All live resting orders with remaining quantity, as serialisable
    /// records: bids best-first then asks best-first, arrival order within
    /// each level. This deterministic order is what makes snapshot →
    /// restore → snapshot a fixpoint.
    pub fn resting_orders(&self) -> Vec<RestingOrder> {
        let mut records = Vec::with_capacity(self.orders.len());
        for entry in self.bids.iter().rev() {
            records.extend(entry.value().iter_orders().iter().map(RestingOrder::from));
        }
        for entry in self.asks.iter() {
            records.extend(entry.value().iter_orders().iter().map(RestingOrder::from));
        }
        records
    }
}
