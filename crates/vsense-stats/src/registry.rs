//! Trained-model markers on disk.
//!
//! The training pipeline writes its artifacts to `<models_root>/<ticker>/`.
//! Only the presence of that directory is consulted; its contents are never
//! inspected here.

use crate::error::StatsResult;
use std::path::{Path, PathBuf};
use tracing::debug;
use vsense_core::Ticker;

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    root: PathBuf,
}

impl ModelRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Marker directory for `ticker`.
    pub fn marker_path(&self, ticker: &Ticker) -> PathBuf {
        self.root.join(ticker.as_str())
    }

    /// Whether a model was trained for `ticker`.
    pub fn has_model(&self, ticker: &Ticker) -> bool {
        let exists = self.marker_path(ticker).is_dir();
        debug!(ticker = %ticker, exists, "Checked model marker");
        exists
    }

    /// Every ticker with a marker directory, sorted. A missing root is empty.
    pub fn trained_tickers(&self) -> StatsResult<Vec<Ticker>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(ticker) = Ticker::new(name) {
                    tickers.push(ticker);
                }
            }
        }
        tickers.sort();
        Ok(tickers)
    }
}
