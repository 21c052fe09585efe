//! Client tests against a real dashboard server on a loopback port.

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use vsense_client::{ClientError, DashboardClient, Series, TickerView, UpdateOutcome};
use vsense_core::Ticker;
use vsense_dashboard::{create_router, AppState, AuthConfig, AuthService, DashboardConfig};
use vsense_persistence::{MemoryStore, StatsStore};
use vsense_pipeline::{PipelineConfig, PipelineRunner, StageCommand};
use vsense_stats::{StatsConfig, StatsProvider, TickerEntry};

struct TestServer {
    base_url: String,
    models: TempDir,
    store: Arc<MemoryStore>,
    _work: TempDir,
}

async fn start_server(fetch: &str, train: &str) -> TestServer {
    let models = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());

    let stats = StatsProvider::new(
        store.clone(),
        StatsConfig {
            models_root: models.path().to_string_lossy().into_owned(),
            tickers: vec![
                TickerEntry::new("INFY.NS", "Infosys Ltd."),
                TickerEntry::new("SMSN.IL", "Samsung Electronics Co., Ltd."),
            ],
        },
    )
    .unwrap();
    let pipeline = PipelineRunner::new(PipelineConfig {
        working_dir: work.path().to_string_lossy().into_owned(),
        fetch: StageCommand::new("sh", &["-c", fetch]),
        train: StageCommand::new("sh", &["-c", train]),
        stage_timeout_secs: 10,
    });
    let auth = AuthService::new(AuthConfig::default());

    let state = AppState::new(Arc::new(stats), Arc::new(pipeline), Arc::new(auth));
    let app = create_router(state, &DashboardConfig::default());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        models,
        store,
        _work: work,
    }
}

async fn admin_client(server: &TestServer) -> DashboardClient {
    let mut client = DashboardClient::new(&server.base_url).unwrap();
    let session = client
        .login("admin@volatisense.com", "admin123")
        .await
        .unwrap();
    assert!(session.user.is_admin());
    client
}

#[tokio::test]
async fn test_missing_then_generate_then_loaded() {
    let server = start_server("true", "true").await;
    let client = admin_client(&server).await;

    let view = client.load_ticker("INFY.NS").await;
    match &view {
        TickerView::Missing { ticker, message } => {
            assert_eq!(ticker, "INFY.NS");
            assert!(message.contains("INFY.NS"));
        }
        other => panic!("expected Missing, got {other:?}"),
    }
    assert!(view.can_generate());

    let summary = client.generate_missing_data().await.unwrap();
    assert_eq!(summary.created, 2);
    assert_eq!(summary.failed, 0);
    assert!(summary.instruction().contains("Analyze Risk again"));

    match client.load_ticker("INFY.NS").await {
        TickerView::Loaded(stats) => {
            assert_eq!(stats.ticker, "INFY.NS");
            assert_eq!(stats.price_history.len(), 30);
            assert_eq!(stats.volatility.len(), 30);
            assert_eq!(stats.var_distribution.len(), 20);
            assert!(stats.var95.split('.').nth(1).is_some_and(|d| d.len() == 2));
            assert!(["Low", "Medium", "High"].contains(&stats.risk_level.as_str()));
            assert!(stats.fetch_time.is_some());
        }
        other => panic!("expected Loaded, got {other:?}"),
    }
}

#[tokio::test]
async fn test_marker_hit_loads_directly() {
    let server = start_server("true", "true").await;
    std::fs::create_dir_all(server.models.path().join("SMSN.IL")).unwrap();
    let client = admin_client(&server).await;

    assert!(matches!(
        client.load_ticker("SMSN.IL").await,
        TickerView::Loaded(_)
    ));
}

#[tokio::test]
async fn test_externally_written_record_is_formatted() {
    let server = start_server("true", "true").await;
    // Shape written by the training program: float metrics, no riskLevel.
    let doc = json!({
        "ticker": "INFY.NS",
        "var95": 45.678,
        "var99": "88.10",
        "cvar": 120,
        "accuracy": 91.234,
        "priceHistory": [],
        "volatilityData": [{"date": "2024-06-01", "volatility": 0.013}],
        "varData": []
    });
    server
        .store
        .insert_if_absent(
            &Ticker::new("INFY.NS").unwrap(),
            doc.as_object().unwrap().clone(),
        )
        .unwrap();

    let client = admin_client(&server).await;
    match client.load_ticker("INFY.NS").await {
        TickerView::Loaded(stats) => {
            assert_eq!(stats.var95, "45.68");
            assert_eq!(stats.var99, "88.10");
            assert_eq!(stats.cvar, "120.00");
            assert_eq!(stats.risk_level, "Unknown");
            assert_eq!(stats.accuracy_display(), "91.23%");
            assert_eq!(stats.price_history, Series::NoData);
            assert_eq!(stats.volatility.len(), 1);
            assert_eq!(stats.var_distribution, Series::NoData);
        }
        other => panic!("expected Loaded, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthenticated_load_fails_with_server_message() {
    let server = start_server("true", "true").await;
    let client = DashboardClient::new(&server.base_url).unwrap();

    match client.load_ticker("INFY.NS").await {
        TickerView::Failed { message } => assert!(message.contains("session")),
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_fails_generically() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = DashboardClient::new(&format!("http://127.0.0.1:{port}")).unwrap();

    assert_eq!(
        client.load_ticker("AAPL").await,
        TickerView::Failed {
            message: "Failed to load model data".to_string()
        }
    );
}

#[tokio::test]
async fn test_update_model_success_and_status() {
    let server = start_server("echo 'downloaded 2 tickers'", "echo 'saved models'").await;
    let client = admin_client(&server).await;

    match client.update_model().await.unwrap() {
        UpdateOutcome::Succeeded { message, logs } => {
            assert_eq!(message, "Model updated successfully!");
            assert!(logs.contains("downloaded 2 tickers"));
            assert!(logs.contains("saved models"));
        }
        other => panic!("expected success, got {other:?}"),
    }

    let progress = client.pipeline_status(0).await.unwrap();
    assert_eq!(progress.state, "succeeded");
    assert!(!progress.is_running());
    let tail = client.pipeline_status(progress.offset).await.unwrap();
    assert!(tail.logs.is_empty());
}

#[tokio::test]
async fn test_update_model_fetch_failure_carries_logs() {
    let server = start_server("echo 'api down' >&2; exit 1", "echo trained").await;
    let client = admin_client(&server).await;

    match client.update_model().await.unwrap() {
        UpdateOutcome::Failed { error, logs } => {
            assert_eq!(error, "Failed to fetch data");
            assert!(logs.contains("api down"));
            assert!(!logs.contains("trained"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_admin_cannot_update() {
    let server = start_server("true", "true").await;

    assert!(signup_user(&server.base_url).await);

    let mut client = DashboardClient::new(&server.base_url).unwrap();
    client.login("kiran@example.com", "kiran-pw").await.unwrap();
    assert!(!client.me().await.unwrap().is_admin());

    match client.update_model().await {
        Err(ClientError::Status { status, .. }) => assert_eq!(status, 403),
        other => panic!("expected 403, got {other:?}"),
    }

    client.logout().await.unwrap();
    assert!(client.token().is_none());
}

#[tokio::test]
async fn test_tickers_listing() {
    let server = start_server("true", "true").await;
    std::fs::create_dir_all(server.models.path().join("INFY.NS")).unwrap();
    let client = admin_client(&server).await;

    let tickers = client.tickers().await.unwrap();
    assert_eq!(tickers.len(), 2);
    assert_eq!(tickers[0].ticker, "INFY.NS");
    assert_eq!(tickers[0].label, "Infosys Ltd.");
    assert!(tickers[0].trained);
    assert!(!tickers[1].trained);
}

/// Register a plain user through the raw HTTP API.
async fn signup_user(base_url: &str) -> bool {
    let response = reqwest::Client::new()
        .post(format!("{base_url}/auth/signup"))
        .json(&json!({ "name": "Kiran", "email": "kiran@example.com", "password": "kiran-pw" }))
        .send()
        .await
        .unwrap();
    response.status().as_u16() == 201
}
