mod config;
mod routes;

use tracing_subscriber::EnvFilter;

use crate::config::HostConfig;

#[tokio::main]
async fn main() {
    // Load .env before the filter reads RUST_LOG.
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, "ignoring unreadable .env");
        }
    }

    if let Err(e) = run().await {
        tracing::error!(error = %e, "eatin failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = HostConfig::from_env().map_err(|e| format!("configuration: {e}"))?;
    let addr = config.socket_addr();

    let app = routes::app(config.public)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;

    tracing::info!(%addr, "eatin listening");
    axum::serve(listener, app).await.map_err(|e| format!("server failed: {e}"))
}
