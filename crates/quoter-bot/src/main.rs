//! Quoter market-making bot - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Ladder market maker for one Binance USD-M futures instrument
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via QUOTER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Secrets may come from a local .env file.
    let dotenv = dotenvy::dotenv().ok();

    quoter_telemetry::init_logging()?;
    info!("Starting quoter v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let config_path = args
        .config
        .or_else(|| std::env::var("QUOTER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());
    info!(config_path = %config_path, "Loading configuration");

    let config = quoter_bot::AppConfig::from_file(&config_path)?;
    info!(
        strategy = %config.strategy.name,
        symbol = %config.exchange.symbol,
        "Configuration loaded"
    );

    let credentials = quoter_bot::Credentials::from_env()?;
    let app = quoter_bot::Application::new(config, credentials);
    app.run().await?;

    Ok(())
}
