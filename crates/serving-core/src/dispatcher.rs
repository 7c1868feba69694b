//! Inference dispatch
//!
//! Runs a validated request through the backend and turns every possible
//! backend outcome, including panics, into either an [`InferenceResult`] or
//! a [`ServingError::BackendInferenceError`].

use crate::backend::Classification;
use crate::error::ServingError;
use crate::lifecycle::{panic_message, ModelLifecycle};
use crate::models::InferenceResult;
use crate::validator::InferenceRequest;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Classify `request` with the lifecycle's backend
pub fn dispatch(
    request: InferenceRequest,
    lifecycle: &ModelLifecycle,
) -> Result<InferenceResult, ServingError> {
    if !lifecycle.is_ready() {
        return Err(not_ready(lifecycle));
    }

    let text = request.into_text();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| lifecycle.classify(&text)));

    let (classification, elapsed) = match outcome {
        Ok(Ok(timed)) => timed,
        Ok(Err(e)) => return Err(ServingError::BackendInferenceError(e.to_string())),
        Err(payload) => {
            return Err(ServingError::BackendInferenceError(format!(
                "backend panicked: {}",
                panic_message(payload.as_ref())
            )))
        }
    };

    check_output(&classification)?;

    if !(0.0..=1.0).contains(&classification.confidence) {
        warn!(
            label = %classification.label,
            confidence = classification.confidence,
            "Backend returned confidence outside [0, 1]"
        );
    }

    debug!(
        label = %classification.label,
        confidence = classification.confidence,
        elapsed_us = elapsed.as_micros() as u64,
        "Inference completed"
    );

    Ok(InferenceResult::new(
        text,
        classification.label,
        classification.confidence,
        elapsed.as_secs_f64(),
    ))
}

pub(crate) fn not_ready(lifecycle: &ModelLifecycle) -> ServingError {
    ServingError::ModelNotReady {
        state: lifecycle.state(),
        reason: lifecycle.failure_reason(),
    }
}

/// Reject output that cannot be represented on the wire
fn check_output(classification: &Classification) -> Result<(), ServingError> {
    if classification.label.trim().is_empty() {
        return Err(ServingError::BackendInferenceError(
            "malformed backend output: empty label".to_string(),
        ));
    }
    if !classification.confidence.is_finite() {
        return Err(ServingError::BackendInferenceError(format!(
            "malformed backend output: confidence is {}",
            classification.confidence
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendLoader, Classifier};
    use crate::error::BackendError;
    use crate::lifecycle::ModelState;
    use crate::validator::validate;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    enum Behavior {
        Fixed(&'static str, f64),
        Fail,
        Panic,
        Sleep(u64),
    }

    struct Stub(Behavior);

    impl Classifier for Stub {
        fn classify(&self, _text: &str) -> Result<Classification, BackendError> {
            match self.0 {
                Behavior::Fixed(label, confidence) => Ok(Classification::new(label, confidence)),
                Behavior::Fail => Err(BackendError::Inference("tensor shape mismatch".into())),
                Behavior::Panic => panic!("index out of bounds"),
                Behavior::Sleep(ms) => {
                    thread::sleep(Duration::from_millis(ms));
                    Ok(Classification::new("POSITIVE", 0.9))
                }
            }
        }
    }

    struct StubLoader(fn() -> Behavior);

    impl BackendLoader for StubLoader {
        fn load(&self) -> Result<Box<dyn Classifier>, BackendError> {
            Ok(Box::new(Stub((self.0)())))
        }

        fn describe(&self) -> String {
            "stub".to_string()
        }
    }

    fn ready(behavior: fn() -> Behavior) -> ModelLifecycle {
        let lifecycle = ModelLifecycle::new(StubLoader(behavior));
        assert_eq!(lifecycle.initialize(), ModelState::Ready);
        lifecycle
    }

    fn request(text: &str) -> InferenceRequest {
        validate(serde_json::json!({ "text": text }).to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_dispatch_builds_result() {
        let lifecycle = ready(|| Behavior::Fixed("POSITIVE", 0.999));
        let result = dispatch(request("I love this product!"), &lifecycle).unwrap();

        assert_eq!(result.input_text(), "I love this product!");
        assert_eq!(result.label(), "POSITIVE");
        assert_eq!(result.confidence(), 0.999);
        assert!(result.latency_seconds() >= 0.0);
    }

    #[test]
    fn test_dispatch_not_ready() {
        let lifecycle = ModelLifecycle::new(StubLoader(|| Behavior::Fixed("POSITIVE", 0.9)));
        let err = dispatch(request("hello"), &lifecycle).unwrap_err();
        assert_eq!(
            err,
            ServingError::ModelNotReady {
                state: ModelState::Uninitialized,
                reason: None
            }
        );
    }

    #[test]
    fn test_backend_error_is_classified() {
        let lifecycle = ready(|| Behavior::Fail);
        let err = dispatch(request("hello"), &lifecycle).unwrap_err();
        assert_eq!(
            err,
            ServingError::BackendInferenceError("tensor shape mismatch".into())
        );
    }

    #[test]
    fn test_backend_panic_is_classified() {
        let lifecycle = ready(|| Behavior::Panic);
        let err = dispatch(request("hello"), &lifecycle).unwrap_err();
        match err {
            ServingError::BackendInferenceError(msg) => {
                assert!(msg.contains("index out of bounds"), "{msg}")
            }
            other => panic!("unexpected error {other:?}"),
        }

        // The lifecycle keeps serving after a panicking call
        assert!(lifecycle.is_ready());
        assert!(dispatch(request("again"), &lifecycle).is_err());
    }

    #[test]
    fn test_out_of_range_confidence_passes_through() {
        let lifecycle = ready(|| Behavior::Fixed("POSITIVE", 1.7));
        let result = dispatch(request("hello"), &lifecycle).unwrap();
        assert_eq!(result.confidence(), 1.7);

        let lifecycle = ready(|| Behavior::Fixed("NEGATIVE", -0.2));
        let result = dispatch(request("hello"), &lifecycle).unwrap();
        assert_eq!(result.confidence(), -0.2);
    }

    #[test]
    fn test_confidence_keeps_full_precision() {
        let lifecycle = ready(|| Behavior::Fixed("POSITIVE", 0.123_456_789_012_345));
        let result = dispatch(request("hello"), &lifecycle).unwrap();
        assert_eq!(result.confidence(), 0.123_456_789_012_345);
    }

    #[test]
    fn test_non_finite_confidence_is_malformed() {
        let lifecycle = ready(|| Behavior::Fixed("POSITIVE", f64::NAN));
        let err = dispatch(request("hello"), &lifecycle).unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::BackendInferenceError);
    }

    #[test]
    fn test_empty_label_is_malformed() {
        let lifecycle = ready(|| Behavior::Fixed("", 0.5));
        let err = dispatch(request("hello"), &lifecycle).unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::BackendInferenceError);
    }

    #[test]
    fn test_latency_excludes_wait_for_backend_lock() {
        let lifecycle = Arc::new(ready(|| Behavior::Sleep(200)));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let lifecycle = Arc::clone(&lifecycle);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    dispatch(request("hello"), &lifecycle)
                        .unwrap()
                        .latency_seconds()
                })
            })
            .collect();

        // The second caller queues for ~200ms but only the call itself counts
        for handle in handles {
            let latency = handle.join().unwrap();
            assert!((0.2..0.3).contains(&latency), "latency {latency}");
        }
    }
}
