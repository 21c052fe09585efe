//! HTTP server implementation using axum.

use std::sync::Arc;

use axum::extract::{FromRef, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use vsense_core::StatsResponse;
use vsense_pipeline::{PipelineOutcome, PipelineRunner, PipelineStatus};
use vsense_stats::{StatsProvider, TickerInfo};
use vsense_telemetry::Metrics;

use crate::auth::{AdminSession, AuthService, CurrentSession, UserProfile};
use crate::config::DashboardConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    GenerateAllResponse, HealthResponse, LoginRequest, LoginResponse, SignupRequest,
    SignupResponse, StatusQuery, UpdateResponse,
};

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    stats: Arc<StatsProvider>,
    pipeline: Arc<PipelineRunner>,
    auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(
        stats: Arc<StatsProvider>,
        pipeline: Arc<PipelineRunner>,
        auth: Arc<AuthService>,
    ) -> Self {
        Self {
            stats,
            pipeline,
            auth,
        }
    }

    pub fn stats(&self) -> &Arc<StatsProvider> {
        &self.stats
    }

    pub fn pipeline(&self) -> &Arc<PipelineRunner> {
        &self.pipeline
    }

    pub fn auth(&self) -> &Arc<AuthService> {
        &self.auth
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Create the axum router.
pub fn create_router(state: AppState, config: &DashboardConfig) -> Router {
    let router = Router::new()
        .route("/", get(serve_index))
        .route("/admin", get(serve_admin))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/tickers", get(list_tickers))
        .route("/stats/generate-all", post(generate_all))
        .route("/stats/{ticker}", get(get_stats))
        .route("/pipeline/update", post(update_model))
        .route("/pipeline/status", get(pipeline_status))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn serve_admin() -> Html<&'static str> {
    Html(include_str!("../static/admin.html"))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        records: state.stats.store().len(),
    })
}

async fn metrics() -> ApiResult<impl IntoResponse> {
    let body = Metrics::render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

async fn list_tickers(
    State(state): State<AppState>,
    _session: CurrentSession,
) -> ApiResult<Json<Vec<TickerInfo>>> {
    Ok(Json(state.stats.catalog()?))
}

async fn get_stats(
    State(state): State<AppState>,
    _session: CurrentSession,
    Path(ticker): Path<String>,
) -> ApiResult<Json<StatsResponse>> {
    let stats = state.stats.clone();
    let response = tokio::task::spawn_blocking(move || stats.get_stats(&ticker))
        .await
        .map_err(|e| ApiError::Server(e.to_string()))??;
    Ok(Json(response))
}

async fn generate_all(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> ApiResult<Json<GenerateAllResponse>> {
    info!(email = %session.user.email, "Batch stats generation requested");
    let stats = state.stats.clone();
    let report = tokio::task::spawn_blocking(move || stats.generate_all_stats())
        .await
        .map_err(|e| ApiError::Server(e.to_string()))?;
    Ok(Json(GenerateAllResponse {
        message: "Stats generated".to_string(),
        report,
    }))
}

async fn update_model(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> ApiResult<Json<UpdateResponse>> {
    info!(email = %session.user.email, "Model update requested");

    match state.pipeline.trigger().await? {
        PipelineOutcome::Succeeded { logs } => {
            // Pick up records the training program wrote.
            let stats = state.stats.clone();
            match tokio::task::spawn_blocking(move || stats.store().reload()).await {
                Ok(Ok(count)) => info!(records = count, "Store reloaded after update"),
                Ok(Err(e)) => warn!(error = %e, "Store reload failed"),
                Err(e) => warn!(error = %e, "Store reload task failed"),
            }
            Ok(Json(UpdateResponse {
                message: "Model updated successfully!".to_string(),
                logs,
            }))
        }
        PipelineOutcome::Failed { error, logs, .. } => Err(ApiError::Upstream { error, logs }),
    }
}

async fn pipeline_status(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(query): Query<StatusQuery>,
) -> Json<PipelineStatus> {
    Json(state.pipeline.status(query.since))
}

async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.auth.signup(&body.name, &body.email, &body.password)?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Account created".to_string(),
            user,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let session = state.auth.login(&body.email, &body.password)?;
    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: session.user,
    }))
}

async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Json<serde_json::Value> {
    state.auth.logout(&session.token);
    Json(serde_json::json!({ "message": "Logged out" }))
}

async fn me(CurrentSession(session): CurrentSession) -> Json<UserProfile> {
    Json(session.user)
}

/// Run the dashboard HTTP server until Ctrl+C.
pub async fn run_server(state: AppState, config: DashboardConfig) -> std::io::Result<()> {
    let app = create_router(state, &config);
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Starting dashboard server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server");
}
