//! Trade records, fee calculation, and the trade recorder.

mod journal;

pub use journal::TradeJournal;

use crate::orderbook::{OrderId, Price, Quantity, Side};
use crate::utils::current_time_millis;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::sync::Mutex;
use tracing::trace;
use uuid::Uuid;

/// Unique trade identifier. The recorder is the only producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeId(Uuid);

impl TradeId {
    fn new() -> Self {
        TradeId(Uuid::new_v4())
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An execution record. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Unique identifier assigned by the recorder.
    pub trade_id: TradeId,
    /// Symbol the execution happened on.
    pub symbol: String,
    /// Execution price (the maker's price).
    pub price: Price,
    /// Executed quantity.
    pub quantity: Quantity,
    /// Side of the incoming (taker) order.
    pub aggressor_side: Side,
    /// Identifier of the resting order.
    pub maker_order_id: OrderId,
    /// Identifier of the incoming order.
    pub taker_order_id: OrderId,
    /// Fee charged to the maker.
    pub maker_fee: f64,
    /// Fee charged to the taker.
    pub taker_fee: f64,
    /// Execution timestamp, milliseconds since the epoch.
    pub timestamp: u64,
}

/// Maker/taker fee rates applied per execution.
///
/// Rates are fractions of the notional (price × quantity); fees are
/// rounded to 4 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee rate for the resting side.
    pub maker_rate: f64,
    /// Fee rate for the incoming side.
    pub taker_rate: f64,
}

impl FeeSchedule {
    /// Create a schedule with explicit rates.
    pub fn new(maker_rate: f64, taker_rate: f64) -> Self {
        Self {
            maker_rate,
            taker_rate,
        }
    }

    /// A schedule charging no fees.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Maker fee for an execution.
    pub fn maker_fee(&self, price: Price, quantity: Quantity) -> f64 {
        round_fee(price.as_f64() * quantity.as_f64() * self.maker_rate)
    }

    /// Taker fee for an execution.
    pub fn taker_fee(&self, price: Price, quantity: Quantity) -> f64 {
        round_fee(price.as_f64() * quantity.as_f64() * self.taker_rate)
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        // 0.05% maker, 0.10% taker.
        Self::new(0.0005, 0.001)
    }
}

fn round_fee(fee: f64) -> f64 {
    (fee * 10_000.0).round() / 10_000.0
}

/// Default capacity of the per-symbol recent-trade ring.
pub const DEFAULT_RECENT_CAPACITY: usize = 1000;

/// Records every execution: assigns trade identifiers, applies fees,
/// keeps a global in-memory history and a bounded per-symbol ring of
/// recent trades, and appends to the durable journal when configured.
pub struct TradeRecorder {
    fees: FeeSchedule,
    recent_capacity: usize,
    history: Mutex<Vec<Trade>>,
    recent: DashMap<String, VecDeque<Trade>>,
    journal: Option<TradeJournal>,
}

impl TradeRecorder {
    /// Create a recorder with the given fee schedule and ring capacity.
    pub fn new(fees: FeeSchedule, recent_capacity: usize) -> Self {
        Self {
            fees,
            recent_capacity,
            history: Mutex::new(Vec::new()),
            recent: DashMap::new(),
            journal: None,
        }
    }

    /// Attach an append-only journal at `path`.
    ///
    /// # Errors
    /// Fails when the journal file cannot be opened for appending.
    pub fn with_journal(
        fees: FeeSchedule,
        recent_capacity: usize,
        path: &Path,
    ) -> std::io::Result<Self> {
        let mut recorder = Self::new(fees, recent_capacity);
        recorder.journal = Some(TradeJournal::open(path)?);
        Ok(recorder)
    }

    /// The active fee schedule.
    pub fn fees(&self) -> FeeSchedule {
        self.fees
    }

    /// Record an execution and return the trade.
    ///
    /// Assigns a fresh trade identifier, computes maker and taker fees,
    /// appends to the global history, the per-symbol ring (evicting the
    /// oldest entry at capacity), and the journal.
    pub fn record(
        &self,
        symbol: &str,
        price: Price,
        quantity: Quantity,
        aggressor_side: Side,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
    ) -> Trade {
        let trade = Trade {
            trade_id: TradeId::new(),
            symbol: symbol.to_string(),
            price,
            quantity,
            aggressor_side,
            maker_order_id,
            taker_order_id,
            maker_fee: self.fees.maker_fee(price, quantity),
            taker_fee: self.fees.taker_fee(price, quantity),
            timestamp: current_time_millis(),
        };

        self.history
            .lock()
            .expect("trade history poisoned")
            .push(trade.clone());

        let mut ring = self.recent.entry(symbol.to_string()).or_default();
        while ring.len() >= self.recent_capacity.max(1) {
            ring.pop_front();
        }
        ring.push_back(trade.clone());
        drop(ring);

        if let Some(journal) = &self.journal {
            journal.append(&trade);
        }

        trace!(
            "trade {}: {} {}@{} ({})",
            trade.trade_id, symbol, quantity, price, aggressor_side
        );
        trade
    }

    /// The most recent trades for a symbol, newest first.
    pub fn recent(&self, symbol: &str, limit: usize) -> Vec<Trade> {
        match self.recent.get(symbol) {
            Some(ring) => ring.iter().rev().take(limit).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// The most recent trades across all symbols, newest first.
    pub fn history(&self, limit: usize) -> Vec<Trade> {
        let history = self.history.lock().expect("trade history poisoned");
        history.iter().rev().take(limit).cloned().collect()
    }

    /// Total number of trades recorded over the engine's lifetime.
    pub fn total_trades(&self) -> usize {
        self.history.lock().expect("trade history poisoned").len()
    }
}
