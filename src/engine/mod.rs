//! The engine facade: symbol registry, admission, and push channels.
//!
//! All book mutation funnels through the facade, which serialises writers
//! per symbol behind a write gate. Reads proceed concurrently on the
//! book's lock-free structures. Push messages are sent while the gate is
//! still held so subscribers observe events in admission order, but a
//! broadcast send never blocks on consumers; a slow subscriber loses
//! messages instead of stalling the matching core.

mod config;
mod events;
mod persistence;

pub use config::EngineConfig;
pub use events::{Bbo, L2Snapshot, MarketDataMessage};
pub use persistence::PersistenceError;

use crate::orderbook::{
    DepthSnapshot, Order, OrderBook, OrderId, OrderKind, OrderStatus, Price, Quantity,
    RestingOrder, Side, Trigger, TriggerKind,
};
use crate::stops::{self, StopBook};
use crate::trades::{FeeSchedule, Trade, TradeRecorder};
use crate::utils::current_time_millis;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Capacity of the broadcast push channels. A subscriber that falls this
/// far behind starts losing messages instead of stalling the engine.
const PUSH_CHANNEL_CAPACITY: usize = 1024;

/// Why an order was rejected at admission or during matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RejectReason {
    /// Limit, IOC, and FOK orders require a price.
    #[error("price required for {0} orders")]
    MissingPrice(OrderKind),

    /// Quantity must be strictly positive.
    #[error("quantity must be positive")]
    NonPositiveQuantity,

    /// Price was non-finite or out of representable range.
    #[error("price is not a valid finite value")]
    InvalidPrice,

    /// Trigger price was non-finite, zero, or out of representable range.
    #[error("trigger price is not a valid finite value")]
    InvalidTriggerPrice,

    /// Conditional orders promote as market or limit orders only.
    #[error("conditional orders must have an underlying type of market or limit")]
    UnsupportedConditionalKind,

    /// Fill-or-kill order could not be filled completely.
    #[error("insufficient liquidity to fill completely")]
    UnfillableFok,
}

/// Outcome class of an order submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// The order was admitted (it may have filled, rested, or both).
    Accepted,
    /// The order was refused; `reason` names why.
    Rejected,
    /// A conditional order was queued pending its trigger.
    Queued,
}

/// An order submission, transport-agnostic.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    /// Symbol to trade.
    pub symbol: String,
    /// Execution semantics.
    pub order_type: OrderKind,
    /// Buy or sell.
    pub side: Side,
    /// Quantity, must be positive.
    pub quantity: f64,
    /// Limit price; required for limit/ioc/fok, ignored for market.
    #[serde(default)]
    pub price: Option<f64>,
}

/// A conditional order submission: a base order plus its trigger.
#[derive(Debug, Clone, Deserialize)]
pub struct StopOrderRequest {
    /// The underlying order, promoted when the trigger fires.
    #[serde(flatten)]
    pub order: OrderRequest,
    /// Price the BBO is compared against.
    pub trigger_price: f64,
    /// Which comparison applies.
    pub trigger_type: TriggerKind,
}

/// Reply to an order submission.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    /// Identifier assigned to the order.
    pub order_id: OrderId,
    /// Number of trades the submission produced.
    pub trades: usize,
    /// Outcome class.
    pub status: ResponseStatus,
    /// Present on rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl OrderResponse {
    fn accepted(order_id: OrderId, trades: usize) -> Self {
        Self {
            order_id,
            trades,
            status: ResponseStatus::Accepted,
            reason: None,
        }
    }

    fn rejected(order_id: OrderId, reason: RejectReason) -> Self {
        Self {
            order_id,
            trades: 0,
            status: ResponseStatus::Rejected,
            reason: Some(reason.to_string()),
        }
    }

    fn queued(order_id: OrderId) -> Self {
        Self {
            order_id,
            trades: 0,
            status: ResponseStatus::Queued,
            reason: None,
        }
    }
}

/// Engine health summary.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    /// Query timestamp, milliseconds since the epoch.
    pub timestamp: u64,
    /// Symbols with a live book.
    pub symbols: Vec<String>,
    /// Trades recorded over the engine's lifetime.
    pub total_trades: usize,
    /// Conditional orders waiting for their trigger.
    pub pending_stops: usize,
}

/// A book plus its write gate. The gate serialises every mutating
/// operation on the book; readers bypass it.
struct SymbolBook {
    book: OrderBook,
    write_gate: Mutex<()>,
}

/// The matching engine: a registry of per-symbol books behind a single
/// entry point for order flow, queries, and push subscriptions.
pub struct MatchingEngine {
    books: DashMap<String, Arc<SymbolBook>>,
    recorder: Arc<TradeRecorder>,
    stops: StopBook,
    config: EngineConfig,
    seq: AtomicU64,
    market_data_tx: broadcast::Sender<MarketDataMessage>,
    trades_tx: broadcast::Sender<Trade>,
}

impl MatchingEngine {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine from explicit configuration.
    ///
    /// A journal path that cannot be opened disables the journal with a
    /// warning; it never prevents the engine from starting.
    pub fn with_config(config: EngineConfig) -> Self {
        if config.price_precision_decimals > crate::orderbook::PRICE_STORAGE_DECIMALS {
            warn!(
                "price precision {} exceeds the storage scale, clamping to {}",
                config.price_precision_decimals,
                crate::orderbook::PRICE_STORAGE_DECIMALS
            );
        }
        let fees = FeeSchedule::new(config.maker_fee_rate, config.taker_fee_rate);
        let recorder = match &config.trade_journal_path {
            Some(path) => match TradeRecorder::with_journal(
                fees,
                config.recent_trades_capacity,
                path,
            ) {
                Ok(recorder) => recorder,
                Err(err) => {
                    warn!(
                        "trade journal {} unavailable, continuing without: {err}",
                        path.display()
                    );
                    TradeRecorder::new(fees, config.recent_trades_capacity)
                }
            },
            None => TradeRecorder::new(fees, config.recent_trades_capacity),
        };

        let (market_data_tx, _) = broadcast::channel(PUSH_CHANNEL_CAPACITY);
        let (trades_tx, _) = broadcast::channel(PUSH_CHANNEL_CAPACITY);

        Self {
            books: DashMap::new(),
            recorder: Arc::new(recorder),
            stops: StopBook::new(),
            config,
            seq: AtomicU64::new(1),
            market_data_tx,
            trades_tx,
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The trade recorder.
    pub fn recorder(&self) -> &TradeRecorder {
        &self.recorder
    }

    /// Symbols with a live book.
    pub fn symbols(&self) -> Vec<String> {
        self.books.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Engine health summary.
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            timestamp: current_time_millis(),
            symbols: self.symbols(),
            total_trades: self.recorder.total_trades(),
            pending_stops: self.stops.pending_count(),
        }
    }

    fn symbol_book(&self, symbol: &str) -> Arc<SymbolBook> {
        self.books
            .entry(symbol.to_string())
            .or_insert_with(|| {
                info!("creating order book for {symbol}");
                Arc::new(SymbolBook {
                    book: OrderBook::new(symbol),
                    write_gate: Mutex::new(()),
                })
            })
            .clone()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn canonical_price(&self, raw: f64) -> Option<Price> {
        Price::canonical(raw, self.config.effective_price_decimals())
    }

    /// Validate a request and build the admitted order.
    fn admit(
        &self,
        request: &OrderRequest,
        trigger: Option<Trigger>,
    ) -> Result<Arc<Order>, RejectReason> {
        let quantity = Quantity::canonical(request.quantity)
            .filter(|quantity| !quantity.is_zero())
            .ok_or(RejectReason::NonPositiveQuantity)?;

        let price = if request.order_type.requires_price() {
            let raw = request
                .price
                .ok_or(RejectReason::MissingPrice(request.order_type))?;
            let price = self
                .canonical_price(raw)
                .filter(|price| !price.is_zero())
                .ok_or(RejectReason::InvalidPrice)?;
            Some(price)
        } else {
            // Market orders match at any price; a supplied price is ignored.
            None
        };

        Ok(Arc::new(Order::new(
            OrderId::new(),
            request.symbol.clone(),
            request.side,
            request.order_type,
            price,
            quantity,
            trigger,
            current_time_millis(),
            self.next_seq(),
        )))
    }

    /// Submit an order. Validation failures come back as a rejected
    /// response with a reason and no book mutation; an unfillable FOK is a
    /// rejection with zero trades and an untouched book.
    pub fn process(&self, request: OrderRequest) -> OrderResponse {
        let order = match self.admit(&request, None) {
            Ok(order) => order,
            Err(reason) => {
                debug!(
                    "rejected {} order for {}: {reason}",
                    request.order_type, request.symbol
                );
                return OrderResponse::rejected(OrderId::new(), reason);
            }
        };

        let trades = self.submit_admitted(&order);
        if order.status() == OrderStatus::Rejected {
            return OrderResponse::rejected(order.id, RejectReason::UnfillableFok);
        }
        OrderResponse::accepted(order.id, trades.len())
    }

    /// Execute an admitted order under its book's write gate and publish
    /// the resulting market-data and trade messages before the gate is
    /// released, so push subscribers see events in admission order.
    fn submit_admitted(&self, order: &Arc<Order>) -> Vec<Trade> {
        let entry = self.symbol_book(&order.symbol);
        let _gate = entry.write_gate.lock().expect("book write gate poisoned");
        let trades = entry.book.execute(order, &self.recorder);

        let altered = !trades.is_empty() || entry.book.order(order.id).is_some();
        if altered {
            self.publish_snapshot(&entry.book);
        }
        for trade in &trades {
            let _ = self.trades_tx.send(trade.clone());
        }
        trades
    }

    /// Submit a conditional order; it is queued until its trigger fires.
    pub fn submit_conditional(&self, request: StopOrderRequest) -> OrderResponse {
        if !matches!(
            request.order.order_type,
            OrderKind::Market | OrderKind::Limit
        ) {
            return OrderResponse::rejected(
                OrderId::new(),
                RejectReason::UnsupportedConditionalKind,
            );
        }

        let trigger_price = match self
            .canonical_price(request.trigger_price)
            .filter(|price| !price.is_zero())
        {
            Some(price) => price,
            None => {
                return OrderResponse::rejected(OrderId::new(), RejectReason::InvalidTriggerPrice);
            }
        };

        let trigger = Trigger {
            price: trigger_price,
            kind: request.trigger_type,
        };
        let pending = match self.admit(&request.order, Some(trigger)) {
            Ok(order) => order,
            Err(reason) => return OrderResponse::rejected(OrderId::new(), reason),
        };
        let id = pending.id;
        self.stops.add(pending);
        OrderResponse::queued(id)
    }

    /// Cancel an order: resting orders first, then the pending conditional
    /// set. Synchronous; true iff the order existed and was removed.
    pub fn cancel(&self, symbol: &str, id: OrderId) -> bool {
        if let Some(entry) = self.books.get(symbol) {
            let symbol_book = entry.value().clone();
            drop(entry);
            let _gate = symbol_book
                .write_gate
                .lock()
                .expect("book write gate poisoned");
            if symbol_book.book.cancel(id) {
                self.publish_snapshot(&symbol_book.book);
                return true;
            }
        }
        self.stops.cancel(symbol, id)
    }

    /// Best bid and offer for a symbol. Unknown symbols yield an empty
    /// quote, never an error.
    pub fn bbo(&self, symbol: &str) -> Bbo {
        let (bid, ask) = match self.books.get(symbol) {
            Some(entry) => (entry.book.best_bid(), entry.book.best_ask()),
            None => (None, None),
        };
        Bbo {
            timestamp: current_time_millis(),
            symbol: symbol.to_string(),
            bid,
            ask,
        }
    }

    /// L2 depth for a symbol. `levels` defaults to the configured depth.
    pub fn depth(&self, symbol: &str, levels: Option<usize>) -> L2Snapshot {
        let levels = levels.unwrap_or(self.config.depth_default_levels);
        let depth = match self.books.get(symbol) {
            Some(entry) => entry.book.depth(levels),
            None => DepthSnapshot {
                bids: Vec::new(),
                asks: Vec::new(),
            },
        };
        L2Snapshot::new(symbol, depth, current_time_millis())
    }

    /// Look up an order: live resting orders first, then pending
    /// conditionals. Filled and cancelled orders are not retained.
    pub fn order_status(&self, symbol: &str, id: OrderId) -> Option<Arc<Order>> {
        if let Some(entry) = self.books.get(symbol) {
            if let Some(order) = entry.book.order(id) {
                return Some(order);
            }
        }
        self.stops.get(symbol, id)
    }

    /// Recent trades for a symbol, newest first.
    pub fn recent_trades(&self, symbol: &str, limit: usize) -> Vec<Trade> {
        self.recorder.recent(symbol, limit)
    }

    /// Subscribe to the market-data push channel.
    pub fn subscribe_market_data(&self) -> broadcast::Receiver<MarketDataMessage> {
        self.market_data_tx.subscribe()
    }

    /// Subscribe to the trade push channel.
    pub fn subscribe_trades(&self) -> broadcast::Receiver<Trade> {
        self.trades_tx.subscribe()
    }

    /// Number of pending conditional orders.
    pub fn pending_stop_count(&self) -> usize {
        self.stops.pending_count()
    }

    /// One pass of the conditional-order watcher: evaluate every pending
    /// order against its symbol's BBO and promote the ones that fire.
    pub fn sweep_stops(&self) {
        for symbol in self.stops.symbols() {
            let quote = self.bbo(&symbol);
            for pending in self.stops.take_triggered(&symbol, quote.bid, quote.ask) {
                self.promote(&pending);
            }
        }
    }

    /// Promote a triggered conditional order: retire its queued identifier,
    /// clear the trigger, and submit it as its underlying kind.
    fn promote(&self, pending: &Arc<Order>) {
        let promoted = Arc::new(Order::new(
            OrderId::new(),
            pending.symbol.clone(),
            pending.side,
            pending.kind,
            pending.price,
            pending.quantity,
            None,
            current_time_millis(),
            self.next_seq(),
        ));
        info!(
            "stop order {} for {} triggered, promoted as {} {}",
            pending.id, pending.symbol, pending.kind, promoted.id
        );
        self.submit_admitted(&promoted);
    }

    /// Spawn the conditional-order monitor loop at the configured cadence.
    pub fn spawn_stop_monitor(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(stops::run_monitor(
            self.clone(),
            self.config.stop_monitor_interval(),
        ))
    }

    /// Spawn the market-data heartbeat loop at the configured cadence.
    pub fn spawn_heartbeat(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let engine = self.clone();
        let interval = self.config.heartbeat_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let _ = engine.market_data_tx.send(MarketDataMessage::Heartbeat {
                    timestamp: current_time_millis(),
                });
            }
        })
    }

    /// Re-admit a persisted resting order with its identifier preserved.
    pub(crate) fn resubmit(&self, record: RestingOrder) -> Vec<Trade> {
        let order = Arc::new(Order::new(
            record.id,
            record.symbol,
            record.side,
            record.order_type,
            Some(record.price),
            record.quantity,
            None,
            record.timestamp,
            self.next_seq(),
        ));
        self.submit_admitted(&order)
    }

    /// Resting orders per symbol, for persistence.
    pub(crate) fn resting_by_symbol(&self) -> Vec<(String, Vec<RestingOrder>)> {
        self.books
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().book.resting_orders()))
            .collect()
    }

    fn publish_snapshot(&self, book: &OrderBook) {
        let depth = book.depth(self.config.depth_default_levels);
        let snapshot = L2Snapshot::new(book.symbol(), depth, current_time_millis());
        let _ = self
            .market_data_tx
            .send(MarketDataMessage::Snapshot(snapshot));
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}
