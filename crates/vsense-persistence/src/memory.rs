//! In-memory store.

use crate::error::PersistenceResult;
use crate::store::{InsertOutcome, StatsStore};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use vsense_core::{Document, Ticker};

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: DashMap<Ticker, Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsStore for MemoryStore {
    fn find(&self, ticker: &Ticker) -> PersistenceResult<Option<Document>> {
        Ok(self.docs.get(ticker).map(|doc| doc.value().clone()))
    }

    fn insert_if_absent(
        &self,
        ticker: &Ticker,
        mut doc: Document,
    ) -> PersistenceResult<InsertOutcome> {
        doc.insert("ticker".to_string(), Value::String(ticker.to_string()));

        // The entry guard holds the shard lock, so check and insert are atomic.
        match self.docs.entry(ticker.clone()) {
            Entry::Occupied(existing) => Ok(InsertOutcome::Exists(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(doc);
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    fn len(&self) -> usize {
        self.docs.len()
    }
}
