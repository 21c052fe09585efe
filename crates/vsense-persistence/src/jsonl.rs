//! JSON Lines file store.
//!
//! Uses JSON Lines format (.jsonl) for robustness:
//! - Each line is a complete document
//! - Partial file corruption only affects individual lines
//! - Other processes (the training pipeline) can append documents
//!
//! The file is read into an index on open and on `reload`. When a ticker
//! appears on several lines the last one wins, which is how an external
//! writer replaces its own earlier output.

use crate::error::PersistenceResult;
use crate::store::{document_ticker, InsertOutcome, StatsStore};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use vsense_core::{Document, Ticker};

struct Inner {
    index: HashMap<Ticker, Document>,
    writer: BufWriter<File>,
    records_written: usize,
}

/// Append-only file store, one document per line.
pub struct JsonLinesStore {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl JsonLinesStore {
    /// Open (or create) the store file at `path`.
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let writer = Self::open_writer(&path)?;
        let index = Self::read_index(&path)?;

        info!(path = %path.display(), records = index.len(), "Opened JSON Lines store");

        Ok(Self {
            path,
            inner: RwLock::new(Inner {
                index,
                writer,
                records_written: 0,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_writer(path: &Path) -> PersistenceResult<BufWriter<File>> {
        // Append mode - never truncates existing data
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(BufWriter::new(file))
    }

    fn read_index(path: &Path) -> PersistenceResult<HashMap<Ticker, Document>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut index = HashMap::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let doc = match serde_json::from_str::<Value>(&line) {
                Ok(Value::Object(doc)) => doc,
                Ok(_) => {
                    warn!(line = line_no + 1, "Skipping non-object line");
                    continue;
                }
                Err(e) => {
                    warn!(line = line_no + 1, error = %e, "Skipping corrupt line");
                    continue;
                }
            };

            match document_ticker(&doc) {
                Ok(ticker) => {
                    index.insert(ticker, doc);
                }
                Err(e) => {
                    warn!(line = line_no + 1, error = %e, "Skipping line without ticker");
                }
            }
        }

        Ok(index)
    }
}

impl StatsStore for JsonLinesStore {
    fn find(&self, ticker: &Ticker) -> PersistenceResult<Option<Document>> {
        Ok(self.inner.read().index.get(ticker).cloned())
    }

    fn insert_if_absent(
        &self,
        ticker: &Ticker,
        mut doc: Document,
    ) -> PersistenceResult<InsertOutcome> {
        doc.insert("ticker".to_string(), Value::String(ticker.to_string()));

        // Write lock held across check, append and index update.
        let mut inner = self.inner.write();
        if let Some(existing) = inner.index.get(ticker) {
            return Ok(InsertOutcome::Exists(existing.clone()));
        }

        let json = serde_json::to_string(&doc)?;
        writeln!(inner.writer, "{}", json)?;
        // Flush to disk immediately
        inner.writer.flush()?;
        inner.records_written += 1;
        inner.index.insert(ticker.clone(), doc);

        debug!(
            ticker = %ticker,
            records_written = inner.records_written,
            "Appended document"
        );

        Ok(InsertOutcome::Inserted)
    }

    fn len(&self) -> usize {
        self.inner.read().index.len()
    }

    fn reload(&self) -> PersistenceResult<usize> {
        let mut inner = self.inner.write();
        inner.writer.flush()?;
        inner.index = Self::read_index(&self.path)?;
        info!(path = %self.path.display(), records = inner.index.len(), "Reloaded JSON Lines store");
        Ok(inner.index.len())
    }
}

impl Drop for JsonLinesStore {
    fn drop(&mut self) {
        if let Err(e) = self.inner.get_mut().writer.flush() {
            warn!(?e, "Failed to flush store on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    fn line_count(path: &Path) -> usize {
        BufReader::new(File::open(path).unwrap())
            .lines()
            .filter_map(|l| l.ok())
            .filter(|l| !l.trim().is_empty())
            .count()
    }

    #[test]
    fn test_write_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model_stats.jsonl");
        let ticker = Ticker::new("HDFCBANK.NS").unwrap();

        {
            let store = JsonLinesStore::open(&path).unwrap();
            let outcome = store
                .insert_if_absent(&ticker, doc(json!({"riskLevel": "Low"})))
                .unwrap();
            assert!(outcome.is_inserted());
        }

        let store = JsonLinesStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        let found = store.find(&ticker).unwrap().unwrap();
        assert_eq!(found["riskLevel"], json!("Low"));
        assert_eq!(found["ticker"], json!("HDFCBANK.NS"));
    }

    #[test]
    fn test_existing_ticker_is_not_appended() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stats.jsonl");
        let store = JsonLinesStore::open(&path).unwrap();
        let ticker = Ticker::new("TITAN.NS").unwrap();

        store.insert_if_absent(&ticker, Document::new()).unwrap();
        let second = store.insert_if_absent(&ticker, Document::new()).unwrap();

        assert!(!second.is_inserted());
        assert_eq!(line_count(&path), 1);
    }

    #[test]
    fn test_skips_corrupt_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stats.jsonl");
        std::fs::write(
            &path,
            "{\"ticker\":\"AAPL\",\"accuracy\":90}\nnot json\n[1,2]\n{\"noTicker\":true}\n",
        )
        .unwrap();

        let store = JsonLinesStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.find(&Ticker::new("AAPL").unwrap()).unwrap().is_some());
    }

    #[test]
    fn test_reload_picks_up_external_writes_last_wins() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stats.jsonl");
        let store = JsonLinesStore::open(&path).unwrap();
        let ticker = Ticker::new("LUPIN.NS").unwrap();
        store
            .insert_if_absent(&ticker, doc(json!({"accuracy": 80.0})))
            .unwrap();

        // Another process appends a newer document for the same ticker.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{}", json!({"ticker": "LUPIN.NS", "accuracy": 93.5})).unwrap();
        writeln!(file, "{}", json!({"ticker": "NTPC.NS", "accuracy": 85.0})).unwrap();
        drop(file);

        assert_eq!(store.reload().unwrap(), 2);
        let found = store.find(&ticker).unwrap().unwrap();
        assert_eq!(found["accuracy"], json!(93.5));
    }

    #[test]
    fn test_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/stats.jsonl");
        let store = JsonLinesStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert!(path.exists());
    }
}
