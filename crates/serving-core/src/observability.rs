//! Observability infrastructure for the serving process
//!
//! Provides:
//! - Prometheus metrics (inference latency, request outcomes, model load time and state)
//! - Structured JSON logging with tracing

use crate::error::ServingError;
use crate::lifecycle::ModelState;
use prometheus::{
    register_gauge, register_histogram, register_int_counter_vec, register_int_gauge, Gauge,
    Histogram, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Default histogram buckets for inference latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Outcome label for successful requests
pub const OUTCOME_OK: &str = "ok";

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServingMetricsInner> = OnceLock::new();

struct ServingMetricsInner {
    inference_latency_seconds: Histogram,
    requests_total: IntCounterVec,
    model_load_seconds: Gauge,
    model_state: IntGauge,
}

impl ServingMetricsInner {
    fn new() -> Self {
        Self {
            inference_latency_seconds: register_histogram!(
                "sentiment_inference_latency_seconds",
                "Time spent inside the backend classify call",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register inference_latency_seconds"),

            requests_total: register_int_counter_vec!(
                "sentiment_requests_total",
                "Predict requests by outcome",
                &["outcome"]
            )
            .expect("Failed to register requests_total"),

            model_load_seconds: register_gauge!(
                "sentiment_model_load_seconds",
                "Wall-clock time of the model load"
            )
            .expect("Failed to register model_load_seconds"),

            model_state: register_int_gauge!(
                "sentiment_model_state",
                "Model lifecycle state (0=uninitialized, 1=loading, 2=ready, 3=failed)"
            )
            .expect("Failed to register model_state"),
        }
    }
}

/// Serving metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ServingMetrics {
    _private: (),
}

impl Default for ServingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServingMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServingMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServingMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_inference_latency(&self, duration_secs: f64) {
        self.inner().inference_latency_seconds.observe(duration_secs);
    }

    /// Count one predict request; `outcome` is [`OUTCOME_OK`] or an error category
    pub fn inc_requests(&self, outcome: &str) {
        self.inner().requests_total.with_label_values(&[outcome]).inc();
    }

    pub fn requests(&self, outcome: &str) -> u64 {
        self.inner().requests_total.with_label_values(&[outcome]).get()
    }

    pub fn set_model_load_seconds(&self, secs: f64) {
        self.inner().model_load_seconds.set(secs);
    }

    pub fn set_model_state(&self, state: ModelState) {
        let value = match state {
            ModelState::Uninitialized => 0,
            ModelState::Loading => 1,
            ModelState::Ready => 2,
            ModelState::Failed => 3,
        };
        self.inner().model_state.set(value);
    }
}

/// Structured logger for serving events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, backend: &str) {
        info!(
            event = "server_started",
            service = %self.service,
            version = %version,
            backend = %backend,
            "Sentiment server started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            service = %self.service,
            reason = %reason,
            "Sentiment server shutting down"
        );
    }

    /// Log the settled lifecycle state after startup
    pub fn log_model_load(&self, state: ModelState, load_secs: f64, reason: Option<&str>) {
        match state {
            ModelState::Ready => info!(
                event = "model_loaded",
                service = %self.service,
                load_time_secs = load_secs,
                "Model loaded successfully in {:.2} seconds",
                load_secs
            ),
            _ => warn!(
                event = "model_load_failed",
                service = %self.service,
                state = %state,
                reason = reason.unwrap_or("unknown"),
                "Model unavailable, predict requests will be rejected"
            ),
        }
    }

    pub fn log_inference_error(&self, err: &ServingError) {
        error!(
            event = "inference_failed",
            service = %self.service,
            category = err.category().as_str(),
            error = %err,
            "Inference error"
        );
    }
}
