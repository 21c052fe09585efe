//! Two-stage model update pipeline.
//!
//! Runs the external data-fetch program, then the training program, as
//! subprocesses. Training never starts unless fetching exits successfully.
//!
//! # State machine
//!
//! ```text
//!   Idle ──► Fetching ──► Training ──► Succeeded
//!               │             │
//!               └─────────────┴──────► Failed
//! ```
//!
//! A new run may start from `Idle`, `Succeeded` or `Failed`; while a run is
//! `Fetching` or `Training` further starts are rejected. Output of both
//! stages is appended line by line to the run's `LogBuffer`, which callers
//! can poll incrementally by byte offset.

pub mod config;
pub mod error;
pub mod log_buffer;
pub mod runner;
pub mod state;

pub use config::{PipelineConfig, StageCommand};
pub use error::{PipelineError, PipelineResult};
pub use log_buffer::{LogBuffer, LogChunk};
pub use runner::{PipelineOutcome, PipelineRun, PipelineRunner, PipelineStatus};
pub use state::{PipelineState, Stage};
