//! Convenience re-exports for downstream users.
//!
//! ```
//! use matchbook_rs::prelude::*;
//! ```

pub use crate::engine::{
    Bbo, EngineConfig, EngineStatus, L2Snapshot, MarketDataMessage, MatchingEngine, OrderRequest,
    OrderResponse, RejectReason, ResponseStatus, StopOrderRequest,
};
pub use crate::orderbook::{
    DepthSnapshot, Order, OrderBook, OrderId, OrderKind, OrderStatus, Price, Quantity,
    RestingOrder, Side, Trigger, TriggerKind,
};
pub use crate::stops::StopBook;
pub use crate::trades::{FeeSchedule, Trade, TradeId, TradeRecorder};
