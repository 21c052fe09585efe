//! Stats provider error types.

use thiserror::Error;
use vsense_persistence::PersistenceError;

#[derive(Debug, Error)]
pub enum StatsError {
    /// No record and no trained-model marker.
    #[error("No stats found for {ticker}. Please run model training first.")]
    NotFound { ticker: String },

    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Record error: {0}")]
    Record(#[from] vsense_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StatsResult<T> = Result<T, StatsError>;
