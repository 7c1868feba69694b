//! Serving facade and the load/predict hosting contract
//!
//! [`serve`] is the one entry point transports call. Readiness is checked
//! first, so an unloaded model reports `ModelNotReady` for any payload, and
//! the backend is never reached unless the payload validated.

use crate::dispatcher::{dispatch, not_ready};
use crate::error::ServingError;
use crate::lifecycle::{ModelLifecycle, ModelState};
use crate::models::InferenceResult;
use crate::validator::{validate, validate_value};
use serde_json::Value;
use std::sync::Arc;

/// Validate a raw request body and classify it
pub fn serve(raw: &[u8], lifecycle: &ModelLifecycle) -> Result<InferenceResult, ServingError> {
    if !lifecycle.is_ready() {
        return Err(not_ready(lifecycle));
    }
    let request = validate(raw)?;
    dispatch(request, lifecycle)
}

/// Same as [`serve`] for hosts that already decoded the payload
pub fn serve_value(
    payload: Option<&Value>,
    lifecycle: &ModelLifecycle,
) -> Result<InferenceResult, ServingError> {
    if !lifecycle.is_ready() {
        return Err(not_ready(lifecycle));
    }
    let request = validate_value(payload)?;
    dispatch(request, lifecycle)
}

/// Reduced contract for hosts that own lifecycle and transport
pub trait ServingModel: Send + Sync {
    /// Load the model; called once by the host before traffic
    fn load(&self) -> ModelState;

    /// Classify one structured input
    fn predict(&self, input: &Value) -> Result<InferenceResult, ServingError>;
}

/// [`ServingModel`] backed by a shared [`ModelLifecycle`]
#[derive(Debug, Clone)]
pub struct HostedModel {
    lifecycle: Arc<ModelLifecycle>,
}

impl HostedModel {
    pub fn new(lifecycle: Arc<ModelLifecycle>) -> Self {
        Self { lifecycle }
    }

    pub fn lifecycle(&self) -> &Arc<ModelLifecycle> {
        &self.lifecycle
    }
}

impl ServingModel for HostedModel {
    fn load(&self) -> ModelState {
        self.lifecycle.initialize()
    }

    fn predict(&self, input: &Value) -> Result<InferenceResult, ServingError> {
        serve_value(Some(input), &self.lifecycle)
    }
}
