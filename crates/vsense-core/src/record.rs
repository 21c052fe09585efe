//! Risk statistics record types.
//!
//! A `RiskStatRecord` holds everything the dashboard renders for one ticker.
//! Records live in the store as loosely typed `Document`s: the external
//! training program writes its own fields (for example `updatedAt`) and
//! numbers where this service writes decimal strings, so the typed form keeps
//! unknown fields in `extra` and accepts either representation.

use crate::error::{CoreError, Result};
use crate::ticker::Ticker;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Loosely typed store document.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Number of daily entries in `priceHistory` and `volatilityData`.
pub const HISTORY_DAYS: usize = 30;

/// Number of buckets in the `varData` loss distribution.
pub const VAR_BUCKETS: usize = 20;

/// Width of one loss bucket, in percent.
pub const VAR_BUCKET_STEP_PCT: f64 = 0.5;

/// Response-only field carrying the time a record was served.
pub const FETCH_TIME_FIELD: &str = "fetchTime";

/// Categorical risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closing price for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Volatility estimate for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityPoint {
    pub date: NaiveDate,
    pub volatility: f64,
}

/// One bucket of the loss distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarBucket {
    /// Loss threshold label, e.g. `"2.5%"`.
    pub loss: String,
    pub probability: f64,
}

impl VarBucket {
    /// Label of the bucket at `index`: `0.0%`, `0.5%`, `1.0%`, ...
    pub fn label_for(index: usize) -> String {
        format!("{:.1}%", index as f64 * VAR_BUCKET_STEP_PCT)
    }
}

/// Risk statistics for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskStatRecord {
    pub ticker: Ticker,
    /// 95% Value-at-Risk, as a currency loss threshold.
    pub var95: Decimal,
    /// 99% Value-at-Risk.
    pub var99: Decimal,
    /// Conditional VaR (expected shortfall beyond VaR95).
    pub cvar: Decimal,
    pub risk_level: RiskLevel,
    /// Classifier accuracy in percent.
    pub accuracy: f64,
    pub price_history: Vec<PricePoint>,
    pub volatility_data: Vec<VolatilityPoint>,
    pub var_data: Vec<VarBucket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Fields this service does not interpret.
    #[serde(flatten)]
    pub extra: Document,
}

impl RiskStatRecord {
    /// Parse a store document.
    pub fn from_document(doc: &Document) -> Result<Self> {
        let record = serde_json::from_value(serde_json::Value::Object(doc.clone()))?;
        Ok(record)
    }

    /// Convert into the store's document form.
    pub fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(CoreError::InvalidRecord(format!(
                "record serialized to non-object: {other}"
            ))),
        }
    }

    /// Whether price and volatility series cover the same dates in order.
    pub fn series_aligned(&self) -> bool {
        self.price_history.len() == self.volatility_data.len()
            && self
                .price_history
                .iter()
                .zip(&self.volatility_data)
                .all(|(p, v)| p.date == v.date)
    }

    /// Check the invariants every synthesized record satisfies.
    ///
    /// Records written by the external training program are not required to
    /// pass: their loss labels follow the observed return distribution.
    pub fn check_invariants(&self) -> Result<()> {
        if !self.series_aligned() {
            return Err(CoreError::InvalidRecord(format!(
                "{}: priceHistory and volatilityData dates differ",
                self.ticker
            )));
        }
        for (i, bucket) in self.var_data.iter().enumerate() {
            let expected = VarBucket::label_for(i);
            if bucket.loss != expected {
                return Err(CoreError::InvalidRecord(format!(
                    "{}: varData[{i}] label {} (expected {expected})",
                    self.ticker, bucket.loss
                )));
            }
        }
        Ok(())
    }
}

/// A stored record as served to a client.
///
/// The document is returned verbatim; `fetchTime` is attached on the way out
/// and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub record: Document,
    #[serde(rename = "fetchTime")]
    pub fetch_time: DateTime<Utc>,
}

impl StatsResponse {
    pub fn new(mut record: Document, fetch_time: DateTime<Utc>) -> Self {
        record.remove(FETCH_TIME_FIELD);
        Self { record, fetch_time }
    }
}
