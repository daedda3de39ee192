//! Serve command - run the HTTP trigger

use std::sync::Arc;

use anyhow::{Context, Result};

use fintrack_core::{Config, IngestService};

use crate::server;

pub async fn run(config: Arc<Config>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.host.clone());
    let port = port.unwrap_or(config.port);

    let service = IngestService::from_config(config, None)?;
    let app = server::router(service);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    tracing::info!(host = %host, port, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}
