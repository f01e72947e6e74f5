use std::net::SocketAddr;

use anyhow::{Context, Result};
use aquarium_config::Configuration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();

    let raw = std::env::var("AQUARIUM_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let address: SocketAddr = raw
        .parse()
        .with_context(|| format!("invalid AQUARIUM_ADDR '{raw}'"))?;

    let config = Configuration::new().context("failed to open the standard configuration")?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "listening");
    axum::serve(listener, aquarium_server::app(config)).await?;
    Ok(())
}
