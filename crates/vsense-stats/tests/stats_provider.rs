//! Stats provider integration tests.
//!
//! Exercises the provider against real model-marker directories and both
//! store backends:
//! - NotFound when neither record nor marker exists
//! - Lazy synthesis on marker hit
//! - Batch idempotence and failure isolation
//! - Round-trip through the JSON Lines store
//! - Concurrent first access

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use vsense_core::{RiskLevel, RiskStatRecord, Ticker, VarBucket, HISTORY_DAYS, VAR_BUCKETS};
use vsense_persistence::{
    InsertOutcome, JsonLinesStore, MemoryStore, PersistenceError, PersistenceResult, SharedStore,
    StatsStore,
};
use vsense_stats::{
    BatchStatus, FixedClock, StatsConfig, StatsError, StatsProvider, Synthesizer, TickerEntry,
};

fn config(models: &TempDir, tickers: &[&str]) -> StatsConfig {
    StatsConfig {
        models_root: models.path().to_string_lossy().into_owned(),
        tickers: tickers.iter().map(|s| TickerEntry::new(s, "")).collect(),
    }
}

fn make_provider(store: SharedStore, models: &TempDir, tickers: &[&str]) -> StatsProvider {
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 7, 15, 8, 0, 0).unwrap());
    StatsProvider::with_parts(
        store,
        config(models, tickers),
        Synthesizer::seeded(2024),
        Arc::new(clock),
    )
    .unwrap()
}

fn mark_trained(models: &TempDir, ticker: &str) {
    std::fs::create_dir_all(models.path().join(ticker)).unwrap();
}

#[test]
fn test_unknown_ticker_without_marker_is_not_found() {
    let models = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let provider = make_provider(store.clone(), &models, &[]);

    for symbol in ["UNKNOWN.NS", "AAPL", "^BSESN"] {
        match provider.get_stats(symbol) {
            Err(StatsError::NotFound { ticker }) => assert_eq!(ticker, symbol),
            other => panic!("expected NotFound for {symbol}, got {other:?}"),
        }
    }
    assert!(store.is_empty());
}

#[test]
fn test_not_found_message_names_ticker() {
    let models = TempDir::new().unwrap();
    let provider = make_provider(Arc::new(MemoryStore::new()), &models, &[]);

    let err = provider.get_stats("UNKNOWN.NS").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("UNKNOWN.NS"));
    assert!(message.contains("run model training first"));
}

#[test]
fn test_marker_hit_synthesizes_one_record() {
    let models = TempDir::new().unwrap();
    mark_trained(&models, "AAPL");
    let store = Arc::new(MemoryStore::new());
    let provider = make_provider(store.clone(), &models, &[]);

    let response = provider.get_stats("AAPL").unwrap();
    let record = RiskStatRecord::from_document(&response.record).unwrap();

    assert_eq!(record.ticker.as_str(), "AAPL");
    assert!(RiskLevel::ALL.contains(&record.risk_level));
    assert!((80.0..=95.0).contains(&record.accuracy));
    assert_eq!(record.price_history.len(), HISTORY_DAYS);
    assert_eq!(record.volatility_data.len(), HISTORY_DAYS);
    assert!(record.series_aligned());
    assert_eq!(record.var_data.len(), VAR_BUCKETS);
    let labels: Vec<String> = record.var_data.iter().map(|b| b.loss.clone()).collect();
    let expected: Vec<String> = (0..VAR_BUCKETS).map(VarBucket::label_for).collect();
    assert_eq!(labels, expected);
    assert!(record.created_at.is_some());

    assert_eq!(store.len(), 1);

    // Second read returns the stored record rather than a new one.
    let again = provider.get_stats("AAPL").unwrap();
    assert_eq!(again.record, response.record);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_fetch_time_is_not_persisted() {
    let models = TempDir::new().unwrap();
    mark_trained(&models, "TCS.NS");
    let store = Arc::new(MemoryStore::new());
    let provider = make_provider(store.clone(), &models, &[]);

    let response = provider.get_stats("TCS.NS").unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert!(json.get("fetchTime").is_some());

    let stored = store.find(&Ticker::new("TCS.NS").unwrap()).unwrap().unwrap();
    assert!(!stored.contains_key("fetchTime"));
}

#[test]
fn test_generate_all_is_idempotent() {
    let models = TempDir::new().unwrap();
    let tickers = ["RELIANCE.NS", "M&M.NS", "AAPL", "SMSN.IL"];
    let store = Arc::new(MemoryStore::new());
    let provider = make_provider(store.clone(), &models, &tickers);

    // One ticker already has a record.
    mark_trained(&models, "AAPL");
    let before = provider.get_stats("AAPL").unwrap();

    let first = provider.generate_all_stats();
    assert_eq!(first.results.len(), tickers.len());
    assert_eq!(first.created, 3);
    assert_eq!(first.exists, 1);
    assert_eq!(store.len(), 4);

    let second = provider.generate_all_stats();
    assert_eq!(second.created, 0);
    assert_eq!(second.exists, 4);
    assert!(second
        .results
        .iter()
        .all(|e| e.status == BatchStatus::Exists));
    assert_eq!(store.len(), 4);

    // Existing record untouched.
    let after = provider.get_stats("AAPL").unwrap();
    assert_eq!(after.record, before.record);
}

#[test]
fn test_round_trip_through_jsonl_store() {
    let models = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let path = data.path().join("model_stats.jsonl");
    mark_trained(&models, "INFY.NS");

    let written = {
        let store: SharedStore = Arc::new(JsonLinesStore::open(&path).unwrap());
        let provider = make_provider(store, &models, &[]);
        RiskStatRecord::from_document(&provider.get_stats("INFY.NS").unwrap().record).unwrap()
    };

    // Remove the marker: the reopened store alone must serve the record.
    std::fs::remove_dir(models.path().join("INFY.NS")).unwrap();
    let store: SharedStore = Arc::new(JsonLinesStore::open(&path).unwrap());
    let provider = make_provider(store, &models, &[]);
    let read =
        RiskStatRecord::from_document(&provider.get_stats("INFY.NS").unwrap().record).unwrap();

    assert_eq!(read.ticker, written.ticker);
    assert_eq!(read.var95, written.var95);
    assert_eq!(read.var99, written.var99);
    assert_eq!(read.cvar, written.cvar);
    assert_eq!(read.risk_level, written.risk_level);
    assert_eq!(read.price_history.len(), written.price_history.len());
    assert_eq!(read.volatility_data.len(), written.volatility_data.len());
    assert_eq!(read.var_data.len(), written.var_data.len());
}

#[test]
fn test_concurrent_first_access_stores_one_record() {
    let models = TempDir::new().unwrap();
    mark_trained(&models, "HDFCBANK.NS");
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(make_provider(store.clone(), &models, &[]));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let provider = provider.clone();
            std::thread::spawn(move || provider.get_stats("HDFCBANK.NS").unwrap().record)
        })
        .collect();
    let docs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(store.len(), 1);
    // Every caller sees the single stored record.
    let stored = store
        .find(&Ticker::new("HDFCBANK.NS").unwrap())
        .unwrap()
        .unwrap();
    assert!(docs.iter().all(|d| *d == stored));
}

/// Store that refuses writes for one ticker.
struct FlakyStore {
    inner: MemoryStore,
    broken: Ticker,
}

impl StatsStore for FlakyStore {
    fn find(&self, ticker: &Ticker) -> PersistenceResult<Option<vsense_core::Document>> {
        self.inner.find(ticker)
    }

    fn insert_if_absent(
        &self,
        ticker: &Ticker,
        doc: vsense_core::Document,
    ) -> PersistenceResult<InsertOutcome> {
        if *ticker == self.broken {
            return Err(PersistenceError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.insert_if_absent(ticker, doc)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

#[test]
fn test_batch_continues_past_failed_ticker() {
    let models = TempDir::new().unwrap();
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        broken: Ticker::new("ITC.NS").unwrap(),
    });
    let provider = make_provider(store.clone(), &models, &["AAPL", "ITC.NS", "TITAN.NS"]);

    let report = provider.generate_all_stats();
    assert_eq!(report.created, 2);
    assert_eq!(report.failed, 1);
    let failed = &report.results[1];
    assert_eq!(failed.ticker.as_str(), "ITC.NS");
    assert_eq!(failed.status, BatchStatus::Failed);
    assert!(failed.error.as_deref().unwrap().contains("disk full"));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_store_failure_surfaces_as_persistence_error() {
    let models = TempDir::new().unwrap();
    mark_trained(&models, "ITC.NS");
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        broken: Ticker::new("ITC.NS").unwrap(),
    });
    let provider = make_provider(store, &models, &[]);

    assert!(matches!(
        provider.get_stats("ITC.NS"),
        Err(StatsError::Persistence(_))
    ));
}
