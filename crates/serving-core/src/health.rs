//! Health reporting for the serving process
//!
//! Health is read from the lifecycle state only; it never touches the
//! backend, so probes stay cheap while inference is in flight.

use crate::lifecycle::{ModelLifecycle, ModelState};
use serde::{Deserialize, Serialize};

/// Health status of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Model is loaded and serving
    Healthy,
    /// Model is still loading
    Degraded,
    /// Model is not loaded or failed to load
    Unhealthy,
}

impl ComponentStatus {
    /// Returns true only when requests can be served
    pub fn is_serving(&self) -> bool {
        matches!(self, ComponentStatus::Healthy)
    }
}

impl From<ModelState> for ComponentStatus {
    fn from(state: ModelState) -> Self {
        match state {
            ModelState::Ready => ComponentStatus::Healthy,
            ModelState::Loading => ComponentStatus::Degraded,
            ModelState::Uninitialized | ModelState::Failed => ComponentStatus::Unhealthy,
        }
    }
}

/// Health response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub model_state: ModelState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_time_seconds: Option<f64>,
    pub last_check_timestamp: i64,
}

impl HealthResponse {
    /// Snapshot the lifecycle
    pub fn from_lifecycle(lifecycle: &ModelLifecycle) -> Self {
        let model_state = lifecycle.state();
        let reason = match model_state {
            ModelState::Ready => None,
            ModelState::Uninitialized => Some("model not loaded".to_string()),
            ModelState::Loading => Some("model loading".to_string()),
            ModelState::Failed => Some(
                lifecycle
                    .failure_reason()
                    .unwrap_or_else(|| "model failed to load".to_string()),
            ),
        };

        Self {
            status: model_state.into(),
            model_state,
            reason,
            load_time_seconds: lifecycle.load_duration().map(|d| d.as_secs_f64()),
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
