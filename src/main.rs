//! Coupon alert relay service.
//!
//! Main entry point. Initializes tracing, loads configuration, and runs
//! the HTTP server until shutdown.

use anyhow::{Context, Result};
use coupon_relay::{AppState, Config};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting coupon alert relay");

    let config = Config::load()?;
    info!(
        directory_url = %config.directory_url,
        host = %config.host,
        port = config.port,
        "Configuration loaded"
    );

    if !config.has_secret() {
        warn!("WEBHOOK_SECRET is not set; webhook deliveries will be refused with 500");
    }

    let addr = config.parse_server_addr()?;
    let state = AppState::from_config(config).context("Failed to build application state")?;

    info!(addr = %addr, "Relay is ready to receive webhooks");

    coupon_relay::start_server(state, addr).await.context("Server failed")?;

    info!("Relay shutdown complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,coupon_relay=debug,tower_http=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer().with_target(true).with_file(true).with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
