//! # Matchbook: a price-time priority matching engine
//!
//! A limit-order matching engine for a single-venue cryptocurrency market.
//! Orders for any number of trading symbols enter through a single engine
//! facade, match against resting orders under strict price-time priority,
//! emit trade executions with maker/taker fees, and maintain a consistent
//! order book (best bid/offer and L2 depth) plus a conditional-order layer
//! that promotes stop orders into the book when their trigger fires.
//!
//! ## Architecture
//!
//! - **Price level** ([`PriceLevel`]): a FIFO queue of resting orders at one
//!   price with an incrementally maintained aggregate quantity. Cancellation
//!   is O(1); the arrival queue skips cancelled entries lazily.
//! - **Order book** ([`OrderBook`]): two concurrent ordered maps of price
//!   levels (bids iterated high-to-low, asks low-to-high) plus an order-id
//!   index, giving O(log n) insertion, cancellation, and best-price lookup.
//! - **Matching core**: per-kind semantics for market, limit,
//!   immediate-or-cancel, and fill-or-kill orders over a common best-first
//!   FIFO pass. The resting order is always the maker and dictates the
//!   execution price; fill-or-kill probes available quantity before touching
//!   the book, so a failed FOK has no side effects.
//! - **Trade recorder** ([`TradeRecorder`]): assigns trade identifiers,
//!   applies maker/taker fee rates, keeps a global history and a bounded
//!   per-symbol ring of recent trades, and appends to a line-delimited
//!   JSON journal for audit.
//! - **Conditional orders** ([`StopBook`]): stop-loss, take-profit, and
//!   stop-limit orders wait outside the book and are evaluated against the
//!   BBO by an async monitor loop; on trigger they are re-admitted as their
//!   underlying market or limit order under a fresh identifier.
//! - **Engine facade** ([`MatchingEngine`]): the symbol → book registry and
//!   the single synchronisation point. Mutations are serialised per book;
//!   reads are lock-free. L2 snapshots and trades are pushed over broadcast
//!   channels that never block on slow subscribers, and book state can be
//!   saved at shutdown and replayed at startup.
//!
//! ## Example
//!
//! ```
//! use matchbook_rs::prelude::*;
//!
//! let engine = MatchingEngine::new();
//!
//! let ask = engine.process(OrderRequest {
//!     symbol: "BTC-USDT".into(),
//!     order_type: OrderKind::Limit,
//!     side: Side::Sell,
//!     quantity: 1.0,
//!     price: Some(30_000.0),
//! });
//! assert_eq!(ask.status, ResponseStatus::Accepted);
//!
//! let bid = engine.process(OrderRequest {
//!     symbol: "BTC-USDT".into(),
//!     order_type: OrderKind::Limit,
//!     side: Side::Buy,
//!     quantity: 1.0,
//!     price: Some(30_000.0),
//! });
//! assert_eq!(bid.trades, 1);
//!
//! let quote = engine.bbo("BTC-USDT");
//! assert!(quote.bid.is_none() && quote.ask.is_none());
//! ```

pub mod engine;
pub mod orderbook;
pub mod prelude;
pub mod stops;
pub mod trades;
mod utils;

pub use engine::{
    Bbo, EngineConfig, EngineStatus, L2Snapshot, MarketDataMessage, MatchingEngine, OrderRequest,
    OrderResponse, PersistenceError, RejectReason, ResponseStatus, StopOrderRequest,
};
pub use orderbook::{
    DepthSnapshot, Order, OrderBook, OrderBookError, OrderId, OrderKind, OrderStatus, Price,
    PriceLevel, Quantity, RestingOrder, Side, Trigger, TriggerKind,
};
pub use stops::StopBook;
pub use trades::{FeeSchedule, Trade, TradeId, TradeJournal, TradeRecorder};
pub use utils::current_time_millis;
