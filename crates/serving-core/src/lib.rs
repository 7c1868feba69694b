//! Serving core for a single text-classification model
//!
//! This crate provides:
//! - Model lifecycle management (load-before-serve, single load attempt)
//! - Request validation with a classified error taxonomy
//! - Synchronous inference dispatch with latency measurement
//! - The serving facade transports call into
//! - ONNX (tract) and lexicon backends
//! - Health reporting and observability

pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod serving;
pub mod validator;

pub use backend::{BackendLoader, Classification, Classifier, LexiconLoader, OnnxSentimentLoader};
pub use dispatcher::dispatch;
pub use error::{BackendError, ErrorCategory, ServingError, StatusClass};
pub use health::{ComponentStatus, HealthResponse};
pub use lifecycle::{ModelLifecycle, ModelState};
pub use models::InferenceResult;
pub use observability::{ServingMetrics, StructuredLogger};
pub use serving::{serve, serve_value, HostedModel, ServingModel};
pub use validator::{validate, validate_value, InferenceRequest};
