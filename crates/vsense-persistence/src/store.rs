//! Store abstraction.

use crate::error::{PersistenceError, PersistenceResult};
use std::sync::Arc;
use vsense_core::{Document, Ticker};

/// Result of a create-if-absent write.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The document was stored.
    Inserted,
    /// A document for the ticker already existed and was left untouched.
    Exists(Document),
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

/// Persistent collection of risk statistics documents, one per ticker.
pub trait StatsStore: Send + Sync {
    /// Exact-match lookup.
    fn find(&self, ticker: &Ticker) -> PersistenceResult<Option<Document>>;

    /// Store `doc` unless a document for `ticker` already exists.
    ///
    /// Two concurrent callers for the same ticker see exactly one `Inserted`.
    fn insert_if_absent(&self, ticker: &Ticker, doc: Document)
        -> PersistenceResult<InsertOutcome>;

    /// Number of stored documents.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pick up documents written by other processes. Returns the new count.
    fn reload(&self) -> PersistenceResult<usize> {
        Ok(self.len())
    }
}

/// Store handle shared across request handlers.
pub type SharedStore = Arc<dyn StatsStore>;

/// Read the `ticker` key of a document.
pub(crate) fn document_ticker(doc: &Document) -> PersistenceResult<Ticker> {
    let raw = doc
        .get("ticker")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PersistenceError::MissingTicker("no ticker field".to_string()))?;
    Ticker::new(raw).map_err(|e| PersistenceError::MissingTicker(e.to_string()))
}
