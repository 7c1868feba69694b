//! Model lifecycle management
//!
//! [`ModelLifecycle`] owns exactly one backend and enforces load-before-serve:
//!
//! ```text
//! Uninitialized --initialize()--> Loading --ok--> Ready   (terminal)
//!                                         --err-> Failed  (terminal)
//! ```
//!
//! Concurrent `initialize()` calls race on a compare-and-set under the state
//! mutex; the loser blocks on a condvar until the winner publishes Ready or
//! Failed. The backend itself sits behind its own mutex, held only for the
//! duration of a `classify` call.

use crate::backend::{BackendLoader, Classification, Classifier};
use crate::error::BackendError;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Readiness of the process-wide model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelState {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

impl ModelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelState::Uninitialized => "uninitialized",
            ModelState::Loading => "loading",
            ModelState::Ready => "ready",
            ModelState::Failed => "failed",
        }
    }

    /// Ready and Failed are never left
    pub fn is_terminal(&self) -> bool {
        matches!(self, ModelState::Ready | ModelState::Failed)
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct LifecycleInner {
    state: ModelState,
    failure: Option<String>,
    load_duration: Option<Duration>,
}

/// Owner of the single backend instance
pub struct ModelLifecycle {
    loader: Box<dyn BackendLoader>,
    inner: Mutex<LifecycleInner>,
    settled: Condvar,
    classifier: OnceLock<Mutex<Box<dyn Classifier>>>,
}

impl ModelLifecycle {
    pub fn new(loader: impl BackendLoader + 'static) -> Self {
        Self::from_boxed(Box::new(loader))
    }

    pub fn from_boxed(loader: Box<dyn BackendLoader>) -> Self {
        Self {
            loader,
            inner: Mutex::new(LifecycleInner {
                state: ModelState::Uninitialized,
                failure: None,
                load_duration: None,
            }),
            settled: Condvar::new(),
            classifier: OnceLock::new(),
        }
    }

    /// Load the backend once and return the resulting terminal state.
    ///
    /// Calls made after the model settled are no-ops that return the existing
    /// state. Calls made while another thread is loading wait for that load.
    /// A load failure is recorded, never propagated.
    pub fn initialize(&self) -> ModelState {
        {
            let mut inner = self.lock_inner();
            loop {
                match inner.state {
                    ModelState::Ready | ModelState::Failed => return inner.state,
                    ModelState::Loading => {
                        inner = self
                            .settled
                            .wait(inner)
                            .unwrap_or_else(PoisonError::into_inner);
                    }
                    ModelState::Uninitialized => {
                        inner.state = ModelState::Loading;
                        break;
                    }
                }
            }
        }

        let backend = self.loader.describe();
        info!(backend = %backend, "Loading model");

        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.loader.load()))
            .unwrap_or_else(|payload| {
                Err(BackendError::Load(format!(
                    "loader panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });
        let elapsed = start.elapsed();

        let mut inner = self.lock_inner();
        match outcome {
            Ok(classifier) => {
                if self.classifier.set(Mutex::new(classifier)).is_err() {
                    warn!("Classifier already installed, keeping the first one");
                }
                inner.state = ModelState::Ready;
                info!(
                    backend = %backend,
                    load_time_secs = elapsed.as_secs_f64(),
                    "Model loaded successfully"
                );
            }
            Err(e) => {
                inner.state = ModelState::Failed;
                inner.failure = Some(e.to_string());
                error!(
                    backend = %backend,
                    error = %e,
                    load_time_secs = elapsed.as_secs_f64(),
                    "Model failed to load"
                );
            }
        }
        inner.load_duration = Some(elapsed);
        let state = inner.state;
        drop(inner);

        self.settled.notify_all();
        state
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ModelState::Ready
    }

    pub fn state(&self) -> ModelState {
        self.lock_inner().state
    }

    /// Load error message, if the model ended up Failed
    pub fn failure_reason(&self) -> Option<String> {
        self.lock_inner().failure.clone()
    }

    /// Wall-clock time of the load attempt, once it finished
    pub fn load_duration(&self) -> Option<Duration> {
        self.lock_inner().load_duration
    }

    pub fn backend_description(&self) -> String {
        self.loader.describe()
    }

    /// Run the backend with exclusive access to it
    ///
    /// The returned duration covers the backend call only, not the wait for
    /// the backend lock.
    pub fn classify(&self, text: &str) -> Result<(Classification, Duration), BackendError> {
        let classifier = self
            .classifier
            .get()
            .ok_or_else(|| BackendError::Inference("model not loaded".to_string()))?;
        let guard = classifier.lock().unwrap_or_else(PoisonError::into_inner);
        let start = Instant::now();
        let classification = guard.classify(text)?;
        Ok((classification, start.elapsed()))
    }

    fn lock_inner(&self) -> MutexGuard<'_, LifecycleInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ModelLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelLifecycle")
            .field("backend", &self.loader.describe())
            .field("state", &self.state())
            .finish()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
