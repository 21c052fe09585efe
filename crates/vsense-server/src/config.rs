//! Application configuration.
//!
//! Loaded from a TOML file, then overridden by `VSENSE__SECTION__KEY`
//! environment variables (e.g. `VSENSE__SERVER__PORT=8080`).

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vsense_dashboard::{AuthConfig, DashboardConfig, MAX_SESSION_TTL_SECS};
use vsense_persistence::StoreConfig;
use vsense_pipeline::PipelineConfig;
use vsense_stats::StatsConfig;

const ENV_PREFIX: &str = "VSENSE";
const ENV_SEPARATOR: &str = "__";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: DashboardConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load from `path` plus environment overrides.
    ///
    /// A missing file is not an error: defaults apply and the environment
    /// can still override them.
    pub fn load(path: &str) -> AppResult<Self> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: &str, env: config::Environment) -> AppResult<Self> {
        let mut builder = config::Config::builder();

        if Path::new(path).exists() {
            builder = builder.add_source(config::File::new(path, config::FileFormat::Toml));
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
        }

        let config: Self = builder
            .add_source(env)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> AppResult<()> {
        self.stats
            .validated_tickers()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if self.pipeline.stage_timeout_secs == 0 {
            return Err(AppError::Config(
                "pipeline.stage_timeout_secs must be positive".to_string(),
            ));
        }
        if self.auth.enabled && self.auth.session_ttl_secs == 0 {
            return Err(AppError::Config(
                "auth.session_ttl_secs must be positive".to_string(),
            ));
        }
        if self.auth.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(AppError::Config(format!(
                "auth.session_ttl_secs must be at most {MAX_SESSION_TTL_SECS}"
            )));
        }
        if self.auth.enabled && self.auth.admin_password.is_empty() {
            return Err(AppError::Config(
                "auth.admin_password must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}
