//! Core domain types for the VolatiSense risk dashboard.
//!
//! This crate provides the types shared by every other crate:
//! - `Ticker`: exchange-qualified symbol, the primary lookup key
//! - `RiskStatRecord`: the per-ticker risk statistics document
//! - `RiskLevel` and the chart series points
//! - `Document`: the loosely typed form records take in the store

pub mod error;
pub mod record;
pub mod ticker;

pub use error::{CoreError, Result};
pub use record::{
    Document, PricePoint, RiskLevel, RiskStatRecord, StatsResponse, VarBucket, VolatilityPoint,
    HISTORY_DAYS, VAR_BUCKETS,
};
pub use ticker::Ticker;
