//! Conditional (stop) orders: the pending set and the monitor loop.
//!
//! Pending orders are held per symbol and evaluated against the BBO on a
//! fixed cadence. A triggered order is removed from the pending set, its
//! trigger cleared, a fresh identifier assigned, and the result submitted
//! through the engine facade as its underlying kind.

use crate::engine::MatchingEngine;
use crate::orderbook::{Order, OrderId, OrderStatus, Price, Side, TriggerKind};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Decide whether a pending conditional order fires against the BBO.
///
/// | Trigger      | Buy fires when   | Sell fires when  |
/// |--------------|------------------|------------------|
/// | stop_loss    | ask >= trigger   | bid <= trigger   |
/// | take_profit  | ask <= trigger   | bid >= trigger   |
/// | stop_limit   | ask >= trigger   | bid <= trigger   |
///
/// Depth is never consulted; a missing side never fires.
pub fn should_trigger(order: &Order, bid: Option<Price>, ask: Option<Price>) -> bool {
    let Some(trigger) = order.trigger else {
        return false;
    };
    match trigger.kind {
        TriggerKind::StopLoss | TriggerKind::StopLimit => match order.side {
            Side::Buy => ask.is_some_and(|ask| ask >= trigger.price),
            Side::Sell => bid.is_some_and(|bid| bid <= trigger.price),
        },
        TriggerKind::TakeProfit => match order.side {
            Side::Buy => ask.is_some_and(|ask| ask <= trigger.price),
            Side::Sell => bid.is_some_and(|bid| bid >= trigger.price),
        },
    }
}

/// The pending conditional orders, grouped by symbol.
pub struct StopBook {
    pending: DashMap<String, Vec<Arc<Order>>>,
}

impl StopBook {
    /// Create an empty stop book.
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Enqueue a conditional order.
    pub fn add(&self, order: Arc<Order>) {
        order.set_status(OrderStatus::PendingTrigger);
        debug!(
            "stop book: queued {} for {} (trigger {:?})",
            order.id, order.symbol, order.trigger
        );
        self.pending
            .entry(order.symbol.clone())
            .or_default()
            .push(order);
    }

    /// Cancel a pending conditional order. Returns `false` when the id is
    /// not pending for the symbol (unknown, or already promoted).
    pub fn cancel(&self, symbol: &str, id: OrderId) -> bool {
        let Some(mut entry) = self.pending.get_mut(symbol) else {
            return false;
        };
        let Some(position) = entry.iter().position(|order| order.id == id) else {
            return false;
        };
        let order = entry.remove(position);
        let now_empty = entry.is_empty();
        drop(entry);
        if now_empty {
            self.pending.remove_if(symbol, |_, orders| orders.is_empty());
        }
        order.set_status(OrderStatus::Cancelled);
        debug!("stop book: cancelled {} for {}", id, symbol);
        true
    }

    /// Look up a pending conditional order.
    pub fn get(&self, symbol: &str, id: OrderId) -> Option<Arc<Order>> {
        self.pending
            .get(symbol)?
            .iter()
            .find(|order| order.id == id)
            .cloned()
    }

    /// Symbols that currently have pending conditional orders.
    pub fn symbols(&self) -> Vec<String> {
        self.pending.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Total number of pending conditional orders.
    pub fn pending_count(&self) -> usize {
        self.pending.iter().map(|entry| entry.value().len()).sum()
    }

    /// Remove and return every pending order for `symbol` whose trigger
    /// condition holds against the given BBO.
    pub fn take_triggered(
        &self,
        symbol: &str,
        bid: Option<Price>,
        ask: Option<Price>,
    ) -> Vec<Arc<Order>> {
        let Some(mut entry) = self.pending.get_mut(symbol) else {
            return Vec::new();
        };
        let mut triggered = Vec::new();
        let mut index = 0;
        while index < entry.len() {
            if should_trigger(&entry[index], bid, ask) {
                triggered.push(entry.remove(index));
            } else {
                index += 1;
            }
        }
        let now_empty = entry.is_empty();
        drop(entry);
        if now_empty {
            self.pending.remove_if(symbol, |_, orders| orders.is_empty());
        }
        triggered
    }
}

impl Default for StopBook {
    fn default() -> Self {
        Self::new()
    }
}

/// The monitor loop: evaluate pending conditional orders against the BBO
/// at a fixed cadence, promoting the ones that fire.
///
/// Runs until the owning task is aborted.
pub async fn run_monitor(engine: Arc<MatchingEngine>, interval: Duration) {
    info!("stop monitor started, cadence {:?}", interval);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        engine.sweep_stops();
    }
}
