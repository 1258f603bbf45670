//! # Advisor Gateway
//!
//! Binary entry point.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG`, `ADVISOR_LOG_FORMAT=json`)
//! 2. Load configuration from the environment
//! 3. Build the service (validates config, builds the siteverify client)
//! 4. Serve until Ctrl+C

use advisor_gateway::{AdvisorGatewayService, GatewayConfig};
use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("ADVISOR_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!(e))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = GatewayConfig::from_env().context("failed to load configuration")?;
    let mut service = AdvisorGatewayService::new(config).context("failed to build service")?;

    if let Some(shutdown) = service.shutdown_handle() {
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl+C received, shutting down");
                    let _ = shutdown.send(());
                }
                Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
            }
        });
    }

    info!(version = advisor_gateway::VERSION, "Starting advisor gateway");
    service.start().await.context("advisor gateway failed")?;

    Ok(())
}
