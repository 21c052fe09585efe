//! Stats lookup and batch generation.

use crate::clock::{Clock, SystemClock};
use crate::config::StatsConfig;
use crate::error::{StatsError, StatsResult};
use crate::registry::ModelRegistry;
use crate::synth::Synthesizer;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vsense_core::{Document, StatsResponse, Ticker};
use vsense_persistence::{InsertOutcome, SharedStore};
use vsense_telemetry::Metrics;

/// Per-ticker result of batch generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Created,
    Exists,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Created => "created",
            BatchStatus::Exists => "exists",
            BatchStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub ticker: Ticker,
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of `generate_all_stats`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub results: Vec<BatchEntry>,
    pub created: usize,
    pub exists: usize,
    pub failed: usize,
}

impl BatchReport {
    fn from_results(results: Vec<BatchEntry>) -> Self {
        let count = |s: BatchStatus| results.iter().filter(|e| e.status == s).count();
        Self {
            created: count(BatchStatus::Created),
            exists: count(BatchStatus::Exists),
            failed: count(BatchStatus::Failed),
            results,
        }
    }
}

/// A configured ticker as offered to the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerInfo {
    pub ticker: Ticker,
    pub label: String,
    pub trained: bool,
    pub has_stats: bool,
}

/// Resolves tickers to risk statistics.
pub struct StatsProvider {
    store: SharedStore,
    registry: ModelRegistry,
    config: StatsConfig,
    tickers: Vec<Ticker>,
    synthesizer: Synthesizer,
    clock: Arc<dyn Clock>,
}

impl StatsProvider {
    /// Create a provider with an entropy-seeded generator and the wall clock.
    pub fn new(store: SharedStore, config: StatsConfig) -> StatsResult<Self> {
        Self::with_parts(
            store,
            config,
            Synthesizer::from_entropy(),
            Arc::new(SystemClock),
        )
    }

    pub fn with_parts(
        store: SharedStore,
        config: StatsConfig,
        synthesizer: Synthesizer,
        clock: Arc<dyn Clock>,
    ) -> StatsResult<Self> {
        let tickers = config.validated_tickers()?;
        let registry = ModelRegistry::new(&config.models_root);
        Ok(Self {
            store,
            registry,
            config,
            tickers,
            synthesizer,
            clock,
        })
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Tickers covered by batch generation.
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Look up the record for `raw_ticker`, synthesizing one if a model marker
    /// exists but no record does.
    pub fn get_stats(&self, raw_ticker: &str) -> StatsResult<StatsResponse> {
        let ticker =
            Ticker::new(raw_ticker).map_err(|e| StatsError::InvalidTicker(e.to_string()))?;

        let lookup = self.lookup(&ticker);
        let outcome = match &lookup {
            Ok((_, true)) => "synthesized",
            Ok((_, false)) => "hit",
            Err(StatsError::NotFound { .. }) => "not_found",
            Err(_) => "error",
        };
        Metrics::stats_request(outcome);

        let (doc, _) = lookup?;
        Ok(StatsResponse::new(doc, self.clock.now()))
    }

    /// Returns the document and whether this call created it.
    fn lookup(&self, ticker: &Ticker) -> StatsResult<(Document, bool)> {
        if let Some(doc) = self.store.find(ticker)? {
            debug!(ticker = %ticker, "Stats found in store");
            return Ok((doc, false));
        }

        if !self.registry.has_model(ticker) {
            info!(ticker = %ticker, "No stats and no trained model");
            return Err(StatsError::NotFound {
                ticker: ticker.to_string(),
            });
        }

        self.create_if_absent(ticker)
    }

    fn create_if_absent(&self, ticker: &Ticker) -> StatsResult<(Document, bool)> {
        let record = self.synthesizer.synthesize(ticker, self.clock.now());
        record.check_invariants()?;
        let doc = record.to_document()?;

        match self.store.insert_if_absent(ticker, doc.clone())? {
            InsertOutcome::Inserted => {
                Metrics::record_synthesized();
                info!(ticker = %ticker, risk_level = %record.risk_level, "Created placeholder stats");
                Ok((doc, true))
            }
            InsertOutcome::Exists(existing) => {
                debug!(ticker = %ticker, "Concurrent request stored stats first");
                Ok((existing, false))
            }
        }
    }

    /// Create placeholder records for every configured ticker that has none.
    ///
    /// Existing records are never touched. A failure on one ticker is
    /// reported in its entry and does not stop the batch.
    pub fn generate_all_stats(&self) -> BatchReport {
        let mut results = Vec::with_capacity(self.tickers.len());

        for ticker in &self.tickers {
            let entry = match self.generate_one(ticker) {
                Ok(status) => BatchEntry {
                    ticker: ticker.clone(),
                    status,
                    error: None,
                },
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "Failed to generate stats");
                    BatchEntry {
                        ticker: ticker.clone(),
                        status: BatchStatus::Failed,
                        error: Some(e.to_string()),
                    }
                }
            };
            Metrics::batch_result(entry.status.as_str());
            results.push(entry);
        }

        let report = BatchReport::from_results(results);
        info!(
            created = report.created,
            exists = report.exists,
            failed = report.failed,
            "Batch stats generation finished"
        );
        report
    }

    fn generate_one(&self, ticker: &Ticker) -> StatsResult<BatchStatus> {
        if self.store.find(ticker)?.is_some() {
            return Ok(BatchStatus::Exists);
        }
        let (_, created) = self.create_if_absent(ticker)?;
        Ok(if created {
            BatchStatus::Created
        } else {
            BatchStatus::Exists
        })
    }

    /// Configured tickers with their labels and availability.
    pub fn catalog(&self) -> StatsResult<Vec<TickerInfo>> {
        let mut catalog = Vec::with_capacity(self.tickers.len());
        for ticker in &self.tickers {
            catalog.push(TickerInfo {
                label: self
                    .config
                    .label_for(ticker.as_str())
                    .unwrap_or(ticker.as_str())
                    .to_string(),
                trained: self.registry.has_model(ticker),
                has_stats: self.store.find(ticker)?.is_some(),
                ticker: ticker.clone(),
            });
        }
        Ok(catalog)
    }
}
