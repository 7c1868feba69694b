//! HTTP API for sentiment prediction, health checks and Prometheus metrics

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use serde_json::json;
use serving_core::{
    observability::OUTCOME_OK, serve, HealthResponse, InferenceResult, ModelLifecycle,
    ServingError, ServingMetrics, StatusClass, StructuredLogger,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<ModelLifecycle>,
    pub metrics: ServingMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        lifecycle: Arc<ModelLifecycle>,
        metrics: ServingMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            lifecycle,
            metrics,
            logger,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    category: &'static str,
}

/// Serving error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub ServingError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self.0.status_class() {
            StatusClass::ClientError => StatusCode::BAD_REQUEST,
            StatusClass::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            StatusClass::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.0.to_string(),
            category: self.0.category().as_str(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// API info
async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Sentiment Analysis API",
        "endpoints": {
            "/": "API info",
            "/health": "Health check",
            "/predict": "POST - Sentiment prediction",
            "/metrics": "Prometheus metrics"
        },
        "example_request": {
            "method": "POST",
            "url": "/predict",
            "body": {"text": "I love this product!"}
        }
    }))
}

/// Health check - 200 when the model is ready, 503 otherwise
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = HealthResponse::from_lifecycle(&state.lifecycle);

    let status_code = if health.status.is_serving() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}

/// Sentiment prediction
async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InferenceResult>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    let outcome = tokio::task::spawn_blocking(move || serve(&body, &lifecycle))
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Inference task did not complete");
            Err(ServingError::BackendInferenceError(
                "inference task did not complete".to_string(),
            ))
        });

    match outcome {
        Ok(result) => {
            state.metrics.inc_requests(OUTCOME_OK);
            state
                .metrics
                .observe_inference_latency(result.latency_seconds());
            Ok(Json(result))
        }
        Err(err) => {
            state.metrics.inc_requests(err.category().as_str());
            if err.status_class() == StatusClass::ServerError {
                state.logger.log_inference_error(&err);
            }
            Err(ApiError(err))
        }
    }
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Bind and run the API server until `shutdown` resolves
pub async fn run(
    addr: &str,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
