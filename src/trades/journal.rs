//! Append-only trade journal: one JSON line per execution.
//!
//! The journal exists for audit; it is never replayed. Write failures are
//! logged and do not interrupt matching.

use crate::trades::Trade;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// A line-delimited JSON file of serialised trade records, opened in
/// append mode. Single writer.
pub struct TradeJournal {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl TradeJournal {
    /// Open (or create) the journal file at `path` for appending.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Path of the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one trade as a JSON line and flush.
    ///
    /// Failures are logged with a warning; the engine keeps running.
    pub fn append(&self, trade: &Trade) {
        let line = match serde_json::to_string(trade) {
            Ok(line) => line,
            Err(err) => {
                warn!("trade journal: failed to serialise {}: {err}", trade.trade_id);
                return;
            }
        };
        let mut writer = self.writer.lock().expect("trade journal poisoned");
        if let Err(err) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            warn!(
                "trade journal: failed to append to {}: {err}",
                self.path.display()
            );
        }
    }
}
