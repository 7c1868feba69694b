//! Error taxonomy for the serving contract
//!
//! Every failure that leaves [`crate::serve`] is one of the [`ServingError`]
//! variants below. Transports map [`ErrorCategory::status_class`] onto their
//! own status codes; this crate never writes to a transport directly.

use crate::lifecycle::ModelState;
use serde::Serialize;
use thiserror::Error;

/// Classified failure of a single serve call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServingError {
    /// Input is not structurally parseable as an object
    #[error("Invalid JSON: {0}")]
    MalformedPayload(String),

    /// No payload was supplied
    #[error("No data provided")]
    EmptyPayload,

    /// A required field is absent
    #[error("Missing '{0}' field in request")]
    MissingField(String),

    /// A field is present but has the wrong JSON type
    #[error("'{field}' must be a {expected}")]
    WrongFieldType { field: String, expected: String },

    /// The text is blank after trimming surrounding whitespace
    #[error("'text' cannot be empty")]
    EmptyText,

    /// The lifecycle is not in the Ready state
    #[error("Model not loaded (state: {state}{})", reason_suffix(.reason))]
    ModelNotReady {
        state: ModelState,
        reason: Option<String>,
    },

    /// The backend failed while classifying
    #[error("Inference failed: {0}")]
    BackendInferenceError(String),
}

impl ServingError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn wrong_field_type(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::WrongFieldType {
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// Category used by transports to pick a status code
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedPayload(_) => ErrorCategory::MalformedPayload,
            Self::EmptyPayload => ErrorCategory::EmptyPayload,
            Self::MissingField(_) => ErrorCategory::MissingField,
            Self::WrongFieldType { .. } => ErrorCategory::WrongFieldType,
            Self::EmptyText => ErrorCategory::EmptyText,
            Self::ModelNotReady { .. } => ErrorCategory::ModelNotReady,
            Self::BackendInferenceError(_) => ErrorCategory::BackendInferenceError,
        }
    }

    pub fn status_class(&self) -> StatusClass {
        self.category().status_class()
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(", reason: {r}"))
        .unwrap_or_default()
}

/// Stable error category, serialized in snake_case on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    MalformedPayload,
    EmptyPayload,
    MissingField,
    WrongFieldType,
    EmptyText,
    ModelNotReady,
    BackendInferenceError,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 7] = [
        ErrorCategory::MalformedPayload,
        ErrorCategory::EmptyPayload,
        ErrorCategory::MissingField,
        ErrorCategory::WrongFieldType,
        ErrorCategory::EmptyText,
        ErrorCategory::ModelNotReady,
        ErrorCategory::BackendInferenceError,
    ];

    pub fn status_class(&self) -> StatusClass {
        match self {
            ErrorCategory::MalformedPayload
            | ErrorCategory::EmptyPayload
            | ErrorCategory::MissingField
            | ErrorCategory::WrongFieldType
            | ErrorCategory::EmptyText => StatusClass::ClientError,
            ErrorCategory::ModelNotReady => StatusClass::ServiceUnavailable,
            ErrorCategory::BackendInferenceError => StatusClass::ServerError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::MalformedPayload => "malformed_payload",
            ErrorCategory::EmptyPayload => "empty_payload",
            ErrorCategory::MissingField => "missing_field",
            ErrorCategory::WrongFieldType => "wrong_field_type",
            ErrorCategory::EmptyText => "empty_text",
            ErrorCategory::ModelNotReady => "model_not_ready",
            ErrorCategory::BackendInferenceError => "backend_inference_error",
        }
    }
}

/// Transport-neutral status class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    ClientError,
    ServiceUnavailable,
    ServerError,
}

/// Failure reported by an inference backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to load model: {0}")]
    Load(String),

    #[error("{0}")]
    Inference(String),

    #[error("malformed backend output: {0}")]
    MalformedOutput(String),

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

impl From<anyhow::Error> for BackendError {
    fn from(err: anyhow::Error) -> Self {
        BackendError::Inference(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_client_status() {
        let errors = [
            ServingError::MalformedPayload("eof".into()),
            ServingError::EmptyPayload,
            ServingError::missing_field("text"),
            ServingError::wrong_field_type("text", "string"),
            ServingError::EmptyText,
        ];
        for err in errors {
            assert_eq!(err.status_class(), StatusClass::ClientError, "{err}");
        }
    }

    #[test]
    fn test_not_ready_is_service_unavailable() {
        let err = ServingError::ModelNotReady {
            state: ModelState::Failed,
            reason: Some("weights missing".into()),
        };
        assert_eq!(err.category(), ErrorCategory::ModelNotReady);
        assert_eq!(err.status_class(), StatusClass::ServiceUnavailable);
        assert_eq!(
            err.to_string(),
            "Model not loaded (state: failed, reason: weights missing)"
        );
    }

    #[test]
    fn test_backend_error_is_server_error() {
        let err = ServingError::BackendInferenceError("boom".into());
        assert_eq!(err.status_class(), StatusClass::ServerError);
        assert_eq!(err.to_string(), "Inference failed: boom");
    }

    #[test]
    fn test_error_messages_match_api_wording() {
        assert_eq!(
            ServingError::missing_field("text").to_string(),
            "Missing 'text' field in request"
        );
        assert_eq!(
            ServingError::wrong_field_type("text", "string").to_string(),
            "'text' must be a string"
        );
        assert_eq!(ServingError::EmptyText.to_string(), "'text' cannot be empty");
    }

    #[test]
    fn test_category_as_str_matches_serde() {
        for category in ErrorCategory::ALL {
            let json = serde_json::to_value(category).unwrap();
            assert_eq!(json, category.as_str());
        }
    }
}
