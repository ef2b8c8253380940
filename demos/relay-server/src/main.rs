//! Runs a roomcast relay on raw TCP.
//!
//! Usage: `relay-server [ADDR]`. The address falls back to
//! `ROOMCAST_BIND`, then `0.0.0.0:8080`. Log verbosity follows `RUST_LOG`.

use roomcast::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let bind = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ROOMCAST_BIND").ok())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let server = RelayServerBuilder::new().bind(&bind).build().await?;
    tracing::info!(addr = %bind, "starting relay");

    server.run().await?;
    Ok(())
}
