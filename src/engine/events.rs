//! Push-channel message types: L2 snapshots, heartbeats, and the BBO view.

use crate::orderbook::{DepthSnapshot, Price, Quantity};
use serde::{Deserialize, Serialize};

/// A full L2 snapshot of one symbol's book, emitted after every operation
/// that altered the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct L2Snapshot {
    /// Emission timestamp, milliseconds since the epoch.
    pub timestamp: u64,
    /// Symbol the snapshot describes.
    pub symbol: String,
    /// Bid levels as `[price, quantity]` pairs, highest first.
    pub bids: Vec<(Price, Quantity)>,
    /// Ask levels as `[price, quantity]` pairs, lowest first.
    pub asks: Vec<(Price, Quantity)>,
}

impl L2Snapshot {
    /// Build a snapshot message from a depth view.
    pub fn new(symbol: &str, depth: DepthSnapshot, timestamp: u64) -> Self {
        Self {
            timestamp,
            symbol: symbol.to_string(),
            bids: depth.bids,
            asks: depth.asks,
        }
    }
}

/// Messages carried by the market-data push channel. Subscribers filter by
/// symbol; per-symbol ordering follows admission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketDataMessage {
    /// Book snapshot after a book-altering operation.
    Snapshot(L2Snapshot),
    /// Periodic keep-alive when nothing changed.
    Heartbeat {
        /// Emission timestamp, milliseconds since the epoch.
        timestamp: u64,
    },
}

/// Best bid and offer for one symbol. Either side may be absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bbo {
    /// Query timestamp, milliseconds since the epoch.
    pub timestamp: u64,
    /// Symbol the quote describes.
    pub symbol: String,
    /// Best (highest) bid price.
    pub bid: Option<Price>,
    /// Best (lowest) ask price.
    pub ask: Option<Price>,
}
