//! Inference backends
//!
//! A backend is split into a [`BackendLoader`] (the expensive, run-once
//! `load` step) and the [`Classifier`] handle it produces. Classifiers only
//! need to be `Send`: the lifecycle manager serializes calls into them.

mod lexicon;
mod onnx;
mod tokenizer;

pub use lexicon::LexiconLoader;
pub use onnx::{softmax, OnnxClassifier, OnnxSentimentLoader, DEFAULT_LABELS};
pub use tokenizer::{BertTokenizer, Encoding};

use crate::error::BackendError;

/// Label and confidence produced by a classifier
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f64,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Loaded model handle
pub trait Classifier: Send {
    /// Classify a single piece of text
    fn classify(&self, text: &str) -> Result<Classification, BackendError>;
}

/// Factory for a classifier; `load` is assumed to take seconds
pub trait BackendLoader: Send + Sync {
    fn load(&self) -> Result<Box<dyn Classifier>, BackendError>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}
