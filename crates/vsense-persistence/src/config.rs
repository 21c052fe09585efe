//! Store configuration.

use crate::error::PersistenceResult;
use crate::jsonl::JsonLinesStore;
use crate::memory::MemoryStore;
use crate::store::SharedStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process-local, lost on restart.
    Memory,
    /// Append-only JSON Lines file.
    #[default]
    Jsonl,
}

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    /// File path for the `jsonl` backend.
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "data/model_stats.jsonl".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: default_path(),
        }
    }
}

/// Open the configured store.
pub fn open_store(config: &StoreConfig) -> PersistenceResult<SharedStore> {
    match config.kind {
        StoreKind::Memory => {
            info!("Using in-memory stats store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreKind::Jsonl => Ok(Arc::new(JsonLinesStore::open(&config.path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.kind, StoreKind::Jsonl);
        assert!(config.path.ends_with(".jsonl"));
    }

    #[test]
    fn test_kind_parses_lowercase() {
        let config: StoreConfig = serde_json::from_str(r#"{"kind":"memory"}"#).unwrap();
        assert_eq!(config.kind, StoreKind::Memory);
        assert_eq!(config.path, default_path());
    }

    #[test]
    fn test_open_memory() {
        let store = open_store(&StoreConfig {
            kind: StoreKind::Memory,
            path: String::new(),
        })
        .unwrap();
        assert!(store.is_empty());
    }
}
