//! Risk statistics provider.
//!
//! Resolves a ticker to its stored risk statistics. When no record exists but
//! a trained-model marker does, a placeholder record is synthesized, stored,
//! and returned so the dashboard has something to render before the training
//! pipeline writes real numbers.
//!
//! # Flow
//!
//! ```text
//! get_stats(ticker)
//!   ├─ store hit ─────────────────────────────► record + fetchTime
//!   └─ store miss
//!        ├─ <models_root>/<ticker>/ exists ─► synthesize ─► insert_if_absent ─► record
//!        └─ no marker ──────────────────────► NotFound
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod provider;
pub mod registry;
pub mod synth;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{default_tickers, StatsConfig, TickerEntry};
pub use error::{StatsError, StatsResult};
pub use provider::{BatchEntry, BatchReport, BatchStatus, StatsProvider, TickerInfo};
pub use registry::ModelRegistry;
pub use synth::Synthesizer;
