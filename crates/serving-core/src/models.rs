//! Core data models for the serving contract

use serde::{Deserialize, Serialize};

/// Outcome of one successful inference
///
/// Immutable once built. `confidence` is the backend's value verbatim and
/// `latency_seconds` covers the backend call only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceResult {
    input_text: String,
    label: String,
    confidence: f64,
    latency_seconds: f64,
}

impl InferenceResult {
    pub(crate) fn new(
        input_text: String,
        label: String,
        confidence: f64,
        latency_seconds: f64,
    ) -> Self {
        Self {
            input_text,
            label,
            confidence,
            latency_seconds,
        }
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn latency_seconds(&self) -> f64 {
        self.latency_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let result = InferenceResult::new("hi".into(), "POSITIVE".into(), 0.5, 0.01);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["inputText"], "hi");
        assert_eq!(json["label"], "POSITIVE");
        assert_eq!(json["confidence"], 0.5);
        assert_eq!(json["latencySeconds"], 0.01);
    }
}
