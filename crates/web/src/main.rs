use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use wiregrant_web::config::AppConfig;
use wiregrant_web::server::{serve, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env().context("configuration error")?;
    info!(
        rpc = %config.rpc_url,
        gateway = %config.gateway_url,
        subnet = %config.subnet,
        "Starting Wiregrant v{}",
        wiregrant_common::VERSION
    );

    let state = Arc::new(
        AppState::from_config(&config)
            .await
            .context("failed to build service state")?,
    );

    serve(config.bind_addr, state).await
}
