//! splitstat - statistical significance server for A/B tests
//!
//! Standalone HTTP server wrapping the pure analysis engine.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tower::limit::ConcurrencyLimitLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use splitstat::config::ServerConfig;
use splitstat::handlers::{build_router, ServiceState};
use splitstat::metrics;
use splitstat::middleware::track_metrics;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    metrics::register_metrics()?;

    let config = ServerConfig::from_env();
    let cors = config.cors.to_layer();
    let max_concurrent = config.max_concurrent_requests;
    let port = config.port;

    let state = Arc::new(ServiceState::new(config));

    let app = build_router(state)
        .layer(axum::middleware::from_fn(track_metrics))
        .layer(ConcurrencyLimitLayer::new(max_concurrent))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// Handle graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
