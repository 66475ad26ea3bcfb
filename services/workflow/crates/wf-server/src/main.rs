//! ION ED workflow server entry point.
//!
//! Initialises tracing, loads configuration from environment variables
//! (prefixed with `IONWF_`), and serves the workflow API over HTTP.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use ionwf_server::routes;
use ionwf_server::state::AppState;

// ===================================================================
// Configuration
// ===================================================================

/// Server configuration loaded from environment variables via `envy`.
///
/// Each field maps to `IONWF_<FIELD>`:
///   - `IONWF_LISTEN_ADDR`          (default `0.0.0.0:8000`)
///   - `IONWF_DIAS_BASE_URL`        (default NOA DIAS API v2)
///   - `IONWF_NEDM_URL`             (default DLR IMPC NEDM endpoint)
///   - `IONWF_REQUEST_TIMEOUT_SECS` (default `30`)
#[derive(Debug, Deserialize)]
struct Config {
    /// Socket address to bind the HTTP server to.
    #[serde(default = "default_listen_addr")]
    listen_addr: String,

    /// Base URL of the DIAS grid database API.
    #[serde(default = "default_dias_base_url")]
    dias_base_url: String,

    /// Full URL of the DLR NEDM2020 model endpoint.
    #[serde(default = "default_nedm_url")]
    nedm_url: String,

    /// Timeout applied to every upstream HTTP request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_dias_base_url() -> String {
    "https://electron.space.noa.gr/dias/api/v2".to_string()
}

fn default_nedm_url() -> String {
    "https://impc.dlr.de/services/models/api/v1/nedm".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

// ===================================================================
// Entry point
// ===================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("ionwf-server starting");

    let config: Config = envy::prefixed("IONWF_")
        .from_env()
        .context("failed to load config from IONWF_* env vars")?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        dias_base_url = %config.dias_base_url,
        nedm_url = %config.nedm_url,
        request_timeout_secs = config.request_timeout_secs,
        "configuration loaded",
    );

    let state = AppState::new(
        &config.dias_base_url,
        &config.nedm_url,
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("failed to initialise application state")?;

    let router = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!("workflow API ready — http://{}", config.listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("ionwf-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) for graceful shutdown.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl-C handler");
    tracing::info!("received shutdown signal");
}
