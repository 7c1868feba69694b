//! Sentiment server - HTTP front end for a single text-classification model
//!
//! Loads the configured model once at startup, then serves predictions,
//! health and metrics until interrupted.

use anyhow::Result;
use sentiment_server::{api, ServerConfig};
use serving_core::{ModelLifecycle, ServingMetrics, StructuredLogger};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting sentiment-server");

    let config = ServerConfig::load()?;
    info!(backend = ?config.backend, model_dir = %config.model_dir.display(), "Server configured");

    let metrics = ServingMetrics::new();
    let logger = StructuredLogger::new("sentiment-server");

    let lifecycle = Arc::new(ModelLifecycle::from_boxed(config.backend_loader()));
    metrics.set_model_state(lifecycle.state());
    logger.log_startup(SERVER_VERSION, &lifecycle.backend_description());

    // Load before accepting traffic; a failed load keeps the process up and unhealthy
    let loading = lifecycle.clone();
    let state = tokio::task::spawn_blocking(move || loading.initialize()).await?;
    let load_secs = lifecycle
        .load_duration()
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    metrics.set_model_state(state);
    metrics.set_model_load_seconds(load_secs);
    logger.log_model_load(state, load_secs, lifecycle.failure_reason().as_deref());

    let app_state = Arc::new(api::AppState::new(lifecycle, metrics, logger.clone()));
    let router = api::create_router(app_state, config.max_body_bytes);

    let shutdown_logger = logger.clone();
    let shutdown = async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown_logger.log_shutdown("SIGINT received");
        }
    };

    api::run(&config.bind_addr(), router, shutdown).await?;
    info!("Shut down");

    Ok(())
}
