//! Engine configuration.

use crate::orderbook::PRICE_STORAGE_DECIMALS;
use crate::trades::DEFAULT_RECENT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Recognised engine options. All fields have defaults, so a config can be
/// deserialised from a partial document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fee rate applied to the resting side of every trade.
    pub maker_fee_rate: f64,

    /// Fee rate applied to the incoming side of every trade.
    pub taker_fee_rate: f64,

    /// Capacity of the per-symbol recent-trade ring; the oldest entry is
    /// evicted at capacity.
    pub recent_trades_capacity: usize,

    /// Cadence of the conditional-order monitor loop, in milliseconds.
    pub stop_monitor_interval_ms: u64,

    /// Number of price levels returned by depth queries that do not name
    /// an explicit level count.
    pub depth_default_levels: usize,

    /// Decimal places prices are canonicalised to at the engine boundary.
    /// Clamped to the storage scale (4).
    pub price_precision_decimals: u32,

    /// Cadence of market-data heartbeats, in milliseconds.
    pub heartbeat_interval_ms: u64,

    /// Path of the append-only trade journal; `None` disables it.
    pub trade_journal_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            maker_fee_rate: 0.0005,
            taker_fee_rate: 0.001,
            recent_trades_capacity: DEFAULT_RECENT_CAPACITY,
            stop_monitor_interval_ms: 500,
            depth_default_levels: 10,
            price_precision_decimals: 2,
            heartbeat_interval_ms: 5000,
            trade_journal_path: None,
        }
    }
}

impl EngineConfig {
    /// The stop monitor cadence as a [`Duration`].
    pub fn stop_monitor_interval(&self) -> Duration {
        Duration::from_millis(self.stop_monitor_interval_ms)
    }

    /// The heartbeat cadence as a [`Duration`].
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Price precision clamped to the internal storage scale.
    pub(crate) fn effective_price_decimals(&self) -> u32 {
        self.price_precision_decimals.min(PRICE_STORAGE_DECIMALS)
    }
}
