//! Request validation
//!
//! Rules run in a fixed order and the first failure wins:
//!
//! 1. the payload parses as a JSON object (`MalformedPayload`)
//! 2. the payload is present and not `null` (`EmptyPayload`)
//! 3. it has a `text` field (`MissingField`)
//! 4. `text` is a string (`WrongFieldType`)
//! 5. `text` is not blank once trimmed (`EmptyText`)
//!
//! Trimming is only used for the emptiness check; the text handed to the
//! backend is the original, untrimmed value.

use crate::error::ServingError;
use serde_json::Value;

/// Name of the input field
pub const TEXT_FIELD: &str = "text";

/// A payload that passed every validation rule
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    payload: Value,
    text: String,
}

impl InferenceRequest {
    /// Original structured payload
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Text to classify, exactly as submitted
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Validate a raw request body
pub fn validate(raw: &[u8]) -> Result<InferenceRequest, ServingError> {
    let value = parse_payload(raw)?;
    validate_value(value.as_ref())
}

/// Validate an already-parsed payload; `None` means no payload was supplied
pub fn validate_value(payload: Option<&Value>) -> Result<InferenceRequest, ServingError> {
    let object = match payload {
        None | Some(Value::Null) => return Err(ServingError::EmptyPayload),
        Some(Value::Object(object)) => object,
        Some(other) => {
            return Err(ServingError::MalformedPayload(format!(
                "expected a JSON object, got {}",
                json_type_name(other)
            )))
        }
    };

    let text = match object.get(TEXT_FIELD) {
        None => return Err(ServingError::missing_field(TEXT_FIELD)),
        Some(Value::String(text)) => text,
        Some(_) => return Err(ServingError::wrong_field_type(TEXT_FIELD, "string")),
    };

    if text.trim().is_empty() {
        return Err(ServingError::EmptyText);
    }

    Ok(InferenceRequest {
        text: text.clone(),
        payload: Value::Object(object.clone()),
    })
}

/// Parse a body into JSON; an empty or whitespace-only body is "no payload"
fn parse_payload(raw: &[u8]) -> Result<Option<Value>, ServingError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(raw)
        .map(Some)
        .map_err(|e| ServingError::MalformedPayload(e.to_string()))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
