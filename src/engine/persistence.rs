//! Best-effort book persistence: per-symbol JSON files of resting orders,
//! written at shutdown and replayed through the facade at startup.

use crate::engine::MatchingEngine;
use crate::orderbook::RestingOrder;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from reading or writing book state files.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem failure.
    #[error("state file i/o: {0}")]
    Io(#[from] std::io::Error),

    /// State could not be encoded.
    #[error("state encoding: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Turn a symbol into a safe file stem (symbols like `BTC/USDT` would
/// otherwise nest directories). The symbol inside each record is
/// authoritative on reload; the file name is only a label.
fn file_stem(symbol: &str) -> String {
    symbol.replace(['/', '\\'], "_")
}

impl MatchingEngine {
    /// Write, per symbol, a JSON array of all resting orders with
    /// remaining quantity into `dir`. Conditional orders are not persisted.
    ///
    /// # Errors
    /// Fails when the directory cannot be created or a file cannot be
    /// written; callers at shutdown log and move on.
    pub fn save_state(&self, dir: &Path) -> Result<(), PersistenceError> {
        fs::create_dir_all(dir)?;
        for (symbol, orders) in self.resting_by_symbol() {
            let path = dir.join(format!("{}.json", file_stem(&symbol)));
            let payload = serde_json::to_string_pretty(&orders)?;
            fs::write(&path, payload)?;
            info!(
                "saved {} resting orders for {} to {}",
                orders.len(),
                symbol,
                path.display()
            );
        }
        Ok(())
    }

    /// Read every `*.json` state file in `dir` and re-submit its orders
    /// through the facade in file order, preserving identifiers. Corrupt
    /// or unreadable files are skipped with a warning.
    ///
    /// Returns the number of orders restored. A missing directory restores
    /// nothing.
    pub fn load_state(&self, dir: &Path) -> Result<usize, PersistenceError> {
        if !dir.exists() {
            return Ok(0);
        }
        let mut restored = 0;
        let mut entries: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        entries.sort();

        for path in entries {
            let payload = match fs::read_to_string(&path) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!("skipping unreadable state file {}: {err}", path.display());
                    continue;
                }
            };
            let orders: Vec<RestingOrder> = match serde_json::from_str(&payload) {
                Ok(orders) => orders,
                Err(err) => {
                    warn!("skipping corrupt state file {}: {err}", path.display());
                    continue;
                }
            };
            for record in orders {
                self.resubmit(record);
                restored += 1;
            }
        }
        info!("restored {restored} resting orders");
        Ok(restored)
    }
}
