use anyhow::Context;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::routes::app;
use crate::state::AppState;

pub async fn handle(config: AppConfig, host: &str, port: Option<u16>) -> anyhow::Result<()> {
    let port = port.unwrap_or(config.api.port);
    tracing::info!("Starting Retention OS API in {:?} mode", config.environment);

    let state = AppState::from_config(config);
    if !state.sessions.is_configured() {
        tracing::warn!("Session verification is not configured; /api routes will answer 503");
    }

    let bind_addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Retention OS API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
