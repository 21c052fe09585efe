//! Document store for risk statistics.
//!
//! Records are loosely typed JSON documents keyed by ticker. Every backend
//! enforces the unique-ticker constraint through `insert_if_absent`, which
//! never overwrites an existing document.

pub mod config;
pub mod error;
pub mod jsonl;
pub mod memory;
pub mod store;

pub use config::{open_store, StoreConfig, StoreKind};
pub use error::{PersistenceError, PersistenceResult};
pub use jsonl::JsonLinesStore;
pub use memory::MemoryStore;
pub use store::{InsertOutcome, SharedStore, StatsStore};
