//! A single price level: a FIFO queue of resting orders at one price.

use crate::orderbook::order::{Order, OrderId};
use crate::orderbook::price::{Price, Quantity};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// One fill produced while walking a level's FIFO.
#[derive(Debug, Clone)]
pub(crate) struct LevelFill {
    /// The resting order that was (partially) consumed.
    pub maker: Arc<Order>,
    /// Quantity executed against it.
    pub quantity: Quantity,
}

/// A price level holds the live orders resting at one price, in strict
/// arrival order, together with an incrementally maintained aggregate of
/// their remaining quantity.
///
/// The queue stores order ids only; live orders live in the id map.
/// Cancellation removes the map entry in O(1) and leaves the queue id
/// stale, to be skipped lazily by the next FIFO walk. The aggregate is
/// adjusted on every append, removal, and fill; it is never recomputed.
pub struct PriceLevel {
    price: Price,
    orders: DashMap<OrderId, Arc<Order>>,
    queue: Mutex<VecDeque<OrderId>>,
    total_quantity: AtomicU64,
}

impl PriceLevel {
    /// Create an empty level at the given price.
    pub fn new(price: Price) -> Self {
        Self {
            price,
            orders: DashMap::new(),
            queue: Mutex::new(VecDeque::new()),
            total_quantity: AtomicU64::new(0),
        }
    }

    /// The price of this level.
    pub fn price(&self) -> Price {
        self.price
    }

    /// Append an order at the back of the FIFO.
    pub fn add_order(&self, order: Arc<Order>) {
        self.total_quantity
            .fetch_add(order.remaining().units(), Ordering::AcqRel);
        self.queue
            .lock()
            .expect("price level queue poisoned")
            .push_back(order.id);
        self.orders.insert(order.id, order);
    }

    /// Remove an order by id. O(1): the queue entry goes stale and is
    /// skipped by the next FIFO walk.
    pub fn remove_order(&self, id: OrderId) -> Option<Arc<Order>> {
        let (_, order) = self.orders.remove(&id)?;
        self.total_quantity
            .fetch_sub(order.remaining().units(), Ordering::AcqRel);
        Some(order)
    }

    /// Aggregate remaining quantity across live orders.
    pub fn total_quantity(&self) -> Quantity {
        Quantity::from_units(self.total_quantity.load(Ordering::Acquire))
    }

    /// Number of live orders at this level.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// True when no live orders remain.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// The first live order in arrival order, without removing it.
    pub fn peek_front(&self) -> Option<Arc<Order>> {
        let mut queue = self.queue.lock().expect("price level queue poisoned");
        while let Some(front) = queue.front().copied() {
            if let Some(order) = self.orders.get(&front) {
                return Some(order.value().clone());
            }
            // Cancelled while queued; drop the stale id.
            queue.pop_front();
        }
        None
    }

    /// Remove and return the first live order in arrival order.
    pub fn pop_front(&self) -> Option<Arc<Order>> {
        let mut queue = self.queue.lock().expect("price level queue poisoned");
        while let Some(front) = queue.pop_front() {
            if let Some((_, order)) = self.orders.remove(&front) {
                self.total_quantity
                    .fetch_sub(order.remaining().units(), Ordering::AcqRel);
                return Some(order);
            }
        }
        None
    }

    /// Live orders in arrival order.
    pub fn iter_orders(&self) -> Vec<Arc<Order>> {
        let queue = self.queue.lock().expect("price level queue poisoned");
        queue
            .iter()
            .filter_map(|id| self.orders.get(id).map(|entry| entry.value().clone()))
            .collect()
    }

    /// Walk the FIFO front-to-back, filling against `incoming` until either
    /// the incoming order or this level is exhausted.
    ///
    /// Fully consumed makers are popped from the queue and the id map;
    /// stale (cancelled) ids are discarded as they surface. A maker left
    /// with remaining quantity stays at the front of the queue.
    pub(crate) fn fill_against(&self, incoming: &Arc<Order>) -> Vec<LevelFill> {
        let mut queue = self.queue.lock().expect("price level queue poisoned");
        let mut fills = Vec::new();

        while !incoming.remaining().is_zero() {
            let Some(front) = queue.front().copied() else {
                break;
            };
            let Some(maker) = self.orders.get(&front).map(|entry| entry.value().clone()) else {
                // Cancelled while queued; drop the stale id.
                queue.pop_front();
                continue;
            };

            let quantity = incoming.remaining().min(maker.remaining());
            if quantity.is_zero() {
                queue.pop_front();
                self.orders.remove(&front);
                continue;
            }

            maker.fill(quantity);
            incoming.fill(quantity);
            self.total_quantity
                .fetch_sub(quantity.units(), Ordering::AcqRel);

            if maker.remaining().is_zero() {
                queue.pop_front();
                self.orders.remove(&front);
            }

            fills.push(LevelFill { maker, quantity });
        }

        fills
    }
}
