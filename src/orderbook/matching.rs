//! The matching core: per-kind order semantics over the common
//! price-time priority pass.

use crate::orderbook::book::OrderBook;
use crate::orderbook::order::{Order, OrderKind, OrderStatus, Side};
use crate::orderbook::price::{Price, Quantity};
use crate::trades::{Trade, TradeRecorder};
use std::sync::Arc;
use tracing::{debug, trace};

impl OrderBook {
    /// Execute an admitted order against this book.
    ///
    /// Behaviour is selected by the order's kind:
    /// - market: match across all levels, discard any residual;
    /// - limit: match within the limit price, rest the residual;
    /// - ioc: match within the limit price, discard the residual;
    /// - fok: probe available quantity first and reject with no side
    ///   effects if the order cannot fill completely.
    ///
    /// Every fill is recorded through `recorder`, which assigns trade
    /// identifiers and fees. Returns the trades in execution order.
    pub fn execute(&self, order: &Arc<Order>, recorder: &TradeRecorder) -> Vec<Trade> {
        match order.kind {
            OrderKind::Market => {
                let trades = self.match_incoming(order, None, recorder);
                if !order.remaining().is_zero() {
                    // Market orders never rest; the residual is discarded.
                    debug!(
                        "book {}: market order {} residual {} discarded",
                        self.symbol(),
                        order.id,
                        order.remaining()
                    );
                    order.set_status(OrderStatus::Cancelled);
                }
                trades
            }
            OrderKind::Limit => {
                let limit = self.limit_price(order);
                let trades = self.match_incoming(order, Some(limit), recorder);
                if !order.remaining().is_zero() {
                    self.rest(order.clone(), limit);
                }
                trades
            }
            OrderKind::Ioc => {
                let limit = self.limit_price(order);
                let trades = self.match_incoming(order, Some(limit), recorder);
                if !order.remaining().is_zero() {
                    debug!(
                        "book {}: ioc order {} residual {} cancelled",
                        self.symbol(),
                        order.id,
                        order.remaining()
                    );
                    order.set_status(OrderStatus::Cancelled);
                }
                trades
            }
            OrderKind::Fok => {
                let limit = self.limit_price(order);
                let available =
                    self.peek_available(order.side, order.quantity, Some(limit));
                if available < order.quantity {
                    debug!(
                        "book {}: fok order {} rejected, available {} < {}",
                        self.symbol(),
                        order.id,
                        available,
                        order.quantity
                    );
                    order.set_status(OrderStatus::Rejected);
                    return Vec::new();
                }
                // The probe guarantees a complete fill.
                self.match_incoming(order, Some(limit), recorder)
            }
        }
    }

    fn limit_price(&self, order: &Order) -> Price {
        // Admission validation guarantees a price on limit/ioc/fok orders.
        match order.price {
            Some(price) => price,
            None => panic!(
                "book {}: {} order {} admitted without a limit price",
                self.symbol(),
                order.kind,
                order.id
            ),
        }
    }

    /// The common matching pass: walk the opposite side in best-first
    /// priority, filling FIFO within each level, until the incoming order
    /// is exhausted or the limit bound stops the walk.
    ///
    /// The execution price of every fill is the maker's level price.
    fn match_incoming(
        &self,
        order: &Arc<Order>,
        limit_price: Option<Price>,
        recorder: &TradeRecorder,
    ) -> Vec<Trade> {
        let opposite = match order.side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };
        if opposite.is_empty() {
            return Vec::new();
        }

        let mut trades = Vec::new();
        let mut empty_levels = Vec::new();

        // SkipMap order gives priority directly: asks ascending for an
        // incoming buy, bids descending for an incoming sell.
        let level_iter: Box<dyn Iterator<Item = _>> = match order.side {
            Side::Buy => Box::new(opposite.iter()),
            Side::Sell => Box::new(opposite.iter().rev()),
        };

        for entry in level_iter {
            let price = *entry.key();
            if let Some(limit) = limit_price {
                match order.side {
                    Side::Buy if price > limit => break,
                    Side::Sell if price < limit => break,
                    _ => {}
                }
            }

            let level = entry.value();
            for fill in level.fill_against(order) {
                if fill.maker.remaining().is_zero() {
                    self.orders.remove(&fill.maker.id);
                }
                let trade = recorder.record(
                    self.symbol(),
                    price,
                    fill.quantity,
                    order.side,
                    fill.maker.id,
                    order.id,
                );
                trace!(
                    "book {}: fill {}@{} maker {} taker {}",
                    self.symbol(),
                    fill.quantity,
                    price,
                    fill.maker.id,
                    order.id
                );
                self.last_trade_price.store(price);
                self.has_traded
                    .store(true, std::sync::atomic::Ordering::Relaxed);
                trades.push(trade);
            }

            if level.is_empty() {
                empty_levels.push(price);
            }
            if order.remaining().is_zero() {
                break;
            }
        }

        for price in empty_levels {
            opposite.remove(&price);
        }

        trades
    }

    /// Non-destructive probe of the quantity available to an incoming
    /// order on the opposite side, under the same price bound the matching
    /// pass would apply. Stops summing as soon as `quantity` is reachable.
    pub fn peek_available(
        &self,
        side: Side,
        quantity: Quantity,
        limit_price: Option<Price>,
    ) -> Quantity {
        let opposite = match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };
        if opposite.is_empty() {
            return Quantity::ZERO;
        }

        let level_iter: Box<dyn Iterator<Item = _>> = match side {
            Side::Buy => Box::new(opposite.iter()),
            Side::Sell => Box::new(opposite.iter().rev()),
        };

        let mut available = Quantity::ZERO;
        for entry in level_iter {
            if available >= quantity {
                break;
            }
            let price = *entry.key();
            if let Some(limit) = limit_price {
                match side {
                    Side::Buy if price > limit => break,
                    Side::Sell if price < limit => break,
                    _ => {}
                }
            }
            available = available.saturating_add(entry.value().total_quantity());
        }

        available
    }
}
