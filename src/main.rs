//! Signaling relay binary
//!
//! Binds to `SIGNAL_RELAY_HOST`:`SIGNAL_RELAY_PORT` (default `0.0.0.0:8765`)
//! and runs until Ctrl-C. Log level comes from `RUST_LOG`.

use signal_relay::{RelayServer, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> signal_relay::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let server = RelayServer::new(config);

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    let stats = server.stats().snapshot();
    tracing::info!(
        connections = stats.total_connections,
        logins = stats.logins,
        routed = stats.messages_routed,
        "Signaling relay stopped"
    );

    Ok(())
}
