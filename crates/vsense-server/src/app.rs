//! Application wiring.

use crate::config::AppConfig;
use crate::error::AppResult;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use vsense_dashboard::{run_server, AppState, AuthService};
use vsense_persistence::open_store;
use vsense_pipeline::PipelineRunner;
use vsense_stats::StatsProvider;

/// How often expired sessions are dropped.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// The assembled server.
pub struct Application {
    config: AppConfig,
    state: AppState,
}

impl Application {
    /// Open the store and build every component.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let store = open_store(&config.store)?;
        info!(
            kind = ?config.store.kind,
            records = store.len(),
            "Stats store opened"
        );

        let stats = StatsProvider::new(store, config.stats.clone())?;
        match stats.registry().trained_tickers() {
            Ok(trained) => info!(
                models_root = %config.stats.models_root,
                trained = trained.len(),
                configured = stats.tickers().len(),
                "Model registry scanned"
            ),
            Err(e) => warn!(
                models_root = %config.stats.models_root,
                error = %e,
                "Model registry not readable"
            ),
        }

        let pipeline = PipelineRunner::new(config.pipeline.clone());
        let auth = AuthService::new(config.auth.clone());
        if !config.auth.enabled {
            warn!("Authentication disabled, every request runs as admin");
        }

        let state = AppState::new(Arc::new(stats), Arc::new(pipeline), Arc::new(auth));
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until Ctrl+C.
    pub async fn run(self) -> AppResult<()> {
        let sweeper = spawn_session_sweeper(self.state.auth().clone());

        let result = run_server(self.state, self.config.server).await;
        sweeper.abort();
        result?;

        info!("Server stopped");
        Ok(())
    }
}

fn spawn_session_sweeper(auth: Arc<AuthService>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = auth.purge_expired();
            if purged > 0 {
                debug!(purged, remaining = auth.session_count(), "Expired sessions purged");
            }
        }
    })
}
