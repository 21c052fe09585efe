//! VolatiSense risk dashboard - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// VolatiSense risk dashboard server
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via VSENSE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Listen port, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    vsense_telemetry::init_logging()?;

    info!("Starting VolatiSense v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > VSENSE_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("VSENSE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let mut config = vsense_server::AppConfig::load(&config_path)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!(
        addr = %config.server.listen_addr(),
        store = ?config.store.kind,
        tickers = config.stats.tickers.len(),
        "Configuration loaded"
    );

    let app = vsense_server::Application::new(config)?;
    app.run().await?;

    Ok(())
}
