//! Per-symbol order book: price levels, sorted sides, and the matching core.

mod book;
mod error;
mod level;
mod matching;
mod order;
mod price;
mod snapshot;

#[cfg(test)]
mod tests;

pub use book::OrderBook;
pub use error::OrderBookError;
pub use level::PriceLevel;
pub use order::{Order, OrderId, OrderKind, OrderStatus, Side, Trigger, TriggerKind};
pub use price::{PRICE_STORAGE_DECIMALS, Price, QUANTITY_STORAGE_DECIMALS, Quantity};
pub use snapshot::{DepthSnapshot, RestingOrder};
