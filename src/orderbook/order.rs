//! Order domain types: sides, kinds, triggers, statuses, and the order itself.

use crate::orderbook::price::{Price, Quantity};
use crossbeam::atomic::AtomicCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Unique order identifier, assigned at admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        OrderId(Uuid::new_v4())
    }

    /// Deterministic identifier for tests and fixtures.
    pub fn from_u128(value: u128) -> Self {
        OrderId(Uuid::from_u128(value))
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy (bid) side.
    Buy,
    /// Sell (ask) side.
    Sell,
}

impl Side {
    /// The opposite side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

/// Execution semantics of an order.
///
/// Conditional (stop) orders are not a kind of their own: they are held by
/// the stop watcher with a [`Trigger`] attached and promoted into the book
/// as their underlying kind (market or limit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Match at any price; residual is discarded, never rested.
    Market,
    /// Match within the limit price; residual rests in the book.
    Limit,
    /// Immediate-or-cancel: match within the limit, discard residual.
    Ioc,
    /// Fill-or-kill: fill completely or reject with no side effects.
    Fok,
}

impl OrderKind {
    /// Whether this kind requires a limit price at admission.
    pub fn requires_price(self) -> bool {
        !matches!(self, OrderKind::Market)
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Market => write!(f, "market"),
            OrderKind::Limit => write!(f, "limit"),
            OrderKind::Ioc => write!(f, "ioc"),
            OrderKind::Fok => write!(f, "fok"),
        }
    }
}

impl FromStr for OrderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market" => Ok(OrderKind::Market),
            "limit" => Ok(OrderKind::Limit),
            "ioc" => Ok(OrderKind::Ioc),
            "fok" => Ok(OrderKind::Fok),
            other => Err(format!("unknown order type: {other}")),
        }
    }
}

/// Trigger condition class for a conditional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Exit on adverse movement: buy triggers at ask >= trigger,
    /// sell at bid <= trigger.
    StopLoss,
    /// Exit on favourable movement: buy triggers at ask <= trigger,
    /// sell at bid >= trigger.
    TakeProfit,
    /// Same predicate as stop-loss; the promoted order is a limit order.
    StopLimit,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerKind::StopLoss => write!(f, "stop_loss"),
            TriggerKind::TakeProfit => write!(f, "take_profit"),
            TriggerKind::StopLimit => write!(f, "stop_limit"),
        }
    }
}

/// Trigger condition attached to a pending conditional order.
///
/// Cleared on promotion: a promoted order carries no trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// Price the BBO is compared against.
    pub price: Price,
    /// Which comparison applies.
    pub kind: TriggerKind,
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Admitted, no fills yet.
    New,
    /// Partially filled, remainder live.
    Partial,
    /// Completely filled.
    Filled,
    /// Cancelled by request, or residual discarded (market/IOC).
    Cancelled,
    /// Rejected at admission or by the fill-or-kill probe.
    Rejected,
    /// Conditional order waiting for its trigger.
    PendingTrigger,
}

/// The unit of intent.
///
/// Remaining quantity and status use interior mutability so the matching
/// core can update resting orders through shared `Arc` handles; every other
/// field is immutable after admission.
#[derive(Debug)]
pub struct Order {
    /// Stable identifier, unique for the engine's lifetime.
    pub id: OrderId,
    /// Symbol this order targets.
    pub symbol: String,
    /// Buy or sell.
    pub side: Side,
    /// Execution semantics.
    pub kind: OrderKind,
    /// Limit price; `None` for market orders.
    pub price: Option<Price>,
    /// Original quantity, immutable post-admission.
    pub quantity: Quantity,
    /// Remaining quantity in base units; only the matching core and
    /// cancellation mutate it.
    remaining: AtomicU64,
    /// Trigger condition for conditional orders; `None` once promoted.
    pub trigger: Option<Trigger>,
    /// Admission timestamp, milliseconds since the epoch.
    pub timestamp_ms: u64,
    /// Admission sequence number issued by the engine facade; breaks
    /// same-millisecond ties and gives a total order per symbol.
    pub seq: u64,
    status: AtomicCell<OrderStatus>,
}

impl Order {
    /// Create an admitted order. Remaining starts at the full quantity.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        kind: OrderKind,
        price: Option<Price>,
        quantity: Quantity,
        trigger: Option<Trigger>,
        timestamp_ms: u64,
        seq: u64,
    ) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            side,
            kind,
            price,
            quantity,
            remaining: AtomicU64::new(quantity.units()),
            trigger,
            timestamp_ms,
            seq,
            status: AtomicCell::new(OrderStatus::New),
        }
    }

    /// Remaining (unfilled) quantity.
    pub fn remaining(&self) -> Quantity {
        Quantity::from_units(self.remaining.load(Ordering::Acquire))
    }

    /// Quantity executed so far.
    pub fn executed(&self) -> Quantity {
        self.quantity.saturating_sub(self.remaining())
    }

    /// Current lifecycle status.
    pub fn status(&self) -> OrderStatus {
        self.status.load()
    }

    /// Set the lifecycle status.
    pub fn set_status(&self, status: OrderStatus) {
        self.status.store(status);
    }

    /// Consume `quantity` from the remaining amount and advance the status
    /// to `Partial` or `Filled`.
    ///
    /// A fill larger than the remaining quantity is an accounting invariant
    /// violation and aborts rather than corrupting the book.
    pub(crate) fn fill(&self, quantity: Quantity) {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(quantity.units())
            });
        match previous {
            Ok(before) if before == quantity.units() => self.set_status(OrderStatus::Filled),
            Ok(_) => self.set_status(OrderStatus::Partial),
            Err(remaining) => panic!(
                "order {} fill underflow: remaining {} < fill {}",
                self.id,
                remaining,
                quantity.units()
            ),
        }
    }
}
