//! Prometheus metrics and structured logging for VolatiSense.
//!
//! - Prometheus metrics for stats lookups, synthesis, and pipeline runs
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, init_logging_with, LogFormat};
pub use metrics::Metrics;
