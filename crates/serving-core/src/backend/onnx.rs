//! ONNX sequence-classification backend using tract
//!
//! Serves a DistilBERT-style sentiment model exported to ONNX with two
//! `int64[1, seq]` inputs (`input_ids`, `attention_mask`) and one
//! `float32[1, num_labels]` logits output.

use super::tokenizer::BertTokenizer;
use super::{BackendLoader, Classification, Classifier};
use crate::error::BackendError;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;
use tracing::{debug, info};

/// SST-2 label order
pub const DEFAULT_LABELS: [&str; 2] = ["NEGATIVE", "POSITIVE"];

const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 128;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Loads `model.onnx` and `tokenizer.json` into an [`OnnxClassifier`]
#[derive(Debug, Clone)]
pub struct OnnxSentimentLoader {
    model_path: PathBuf,
    tokenizer_path: PathBuf,
    labels: Vec<String>,
    max_sequence_length: usize,
    expected_sha256: Option<String>,
}

impl OnnxSentimentLoader {
    pub fn new(model_path: impl Into<PathBuf>, tokenizer_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            tokenizer_path: tokenizer_path.into(),
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
            expected_sha256: None,
        }
    }

    /// Expect `model.onnx` and `tokenizer.json` inside `dir`
    pub fn from_dir(dir: &Path) -> Self {
        Self::new(dir.join("model.onnx"), dir.join("tokenizer.json"))
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_max_sequence_length(mut self, max_sequence_length: usize) -> Self {
        self.max_sequence_length = max_sequence_length;
        self
    }

    pub fn with_checksum(mut self, sha256: Option<String>) -> Self {
        self.expected_sha256 = sha256.map(|s| s.to_lowercase());
        self
    }

    fn verify_checksum(&self, bytes: &[u8]) -> Result<(), BackendError> {
        let Some(expected) = &self.expected_sha256 else {
            return Ok(());
        };
        let actual = compute_checksum(bytes);
        if &actual != expected {
            return Err(BackendError::ChecksumMismatch {
                path: self.model_path.display().to_string(),
                expected: expected.clone(),
                actual,
            });
        }
        debug!(checksum = %actual, "Model checksum validated");
        Ok(())
    }

    fn build_plan(&self, model_bytes: &[u8]) -> Result<TractModel> {
        let shape = [1, self.max_sequence_length];
        let plan = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, i64::fact(shape).into())
            .context("Failed to set input_ids shape")?
            .with_input_fact(1, i64::fact(shape).into())
            .context("Failed to set attention_mask shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(plan)
    }
}

impl BackendLoader for OnnxSentimentLoader {
    fn load(&self) -> Result<Box<dyn Classifier>, BackendError> {
        if self.labels.is_empty() {
            return Err(BackendError::Load("label list is empty".to_string()));
        }

        let model_bytes = std::fs::read(&self.model_path).map_err(|e| {
            BackendError::Load(format!(
                "failed to read model {}: {}",
                self.model_path.display(),
                e
            ))
        })?;
        self.verify_checksum(&model_bytes)?;

        let plan = self
            .build_plan(&model_bytes)
            .map_err(|e| BackendError::Load(format!("{e:#}")))?;
        let tokenizer = BertTokenizer::from_file(&self.tokenizer_path)?;

        info!(
            model = %self.model_path.display(),
            vocab_size = tokenizer.vocab_size(),
            max_sequence_length = self.max_sequence_length,
            "ONNX sentiment model ready"
        );

        Ok(Box::new(OnnxClassifier {
            plan,
            tokenizer,
            labels: self.labels.clone(),
            max_sequence_length: self.max_sequence_length,
        }))
    }

    fn describe(&self) -> String {
        format!("onnx:{}", self.model_path.display())
    }
}

pub struct OnnxClassifier {
    plan: TractModel,
    tokenizer: BertTokenizer,
    labels: Vec<String>,
    max_sequence_length: usize,
}

impl OnnxClassifier {
    fn logits(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        let encoding = self.tokenizer.encode(text, self.max_sequence_length)?;
        Ok(self.run(encoding.input_ids, encoding.attention_mask)?)
    }

    fn run(&self, input_ids: Vec<i64>, attention_mask: Vec<i64>) -> Result<Vec<f32>> {
        let shape = (1, self.max_sequence_length);

        let input_ids: Tensor =
            tract_ndarray::Array2::from_shape_vec(shape, input_ids)?.into();
        let attention_mask: Tensor =
            tract_ndarray::Array2::from_shape_vec(shape, attention_mask)?.into();

        let outputs = self
            .plan
            .run(tvec!(input_ids.into(), attention_mask.into()))?;
        let logits = outputs.first().context("No output from model")?;
        Ok(logits.to_array_view::<f32>()?.iter().copied().collect())
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, text: &str) -> Result<Classification, BackendError> {
        let logits = self.logits(text)?;
        classification_from_logits(&logits, &self.labels)
    }
}

/// Pick the arg-max label and report its softmax probability
fn classification_from_logits(
    logits: &[f32],
    labels: &[String],
) -> Result<Classification, BackendError> {
    if logits.len() != labels.len() {
        return Err(BackendError::MalformedOutput(format!(
            "model produced {} logits for {} labels",
            logits.len(),
            labels.len()
        )));
    }

    let probabilities = softmax(logits);
    let (index, confidence) = probabilities
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| BackendError::MalformedOutput("model produced no logits".to_string()))?;

    Ok(Classification::new(labels[index].clone(), f64::from(confidence)))
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        DEFAULT_LABELS.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_handles_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_classification_picks_argmax() {
        let result = classification_from_logits(&[-4.2, 4.6], &labels()).unwrap();
        assert_eq!(result.label, "POSITIVE");
        assert!(result.confidence > 0.99);
    }

    #[test]
    fn test_logit_label_mismatch_is_malformed() {
        let err = classification_from_logits(&[0.1, 0.2, 0.3], &labels()).unwrap_err();
        assert!(matches!(err, BackendError::MalformedOutput(_)));
    }

    #[test]
    fn test_load_missing_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        let loader = OnnxSentimentLoader::from_dir(dir.path());
        let err = loader.load().err().unwrap();
        assert!(matches!(err, BackendError::Load(_)));
    }

    #[test]
    fn test_checksum_mismatch_rejected_before_parse() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.onnx"), b"not really onnx").unwrap();

        let loader = OnnxSentimentLoader::from_dir(dir.path()).with_checksum(Some("00".repeat(32)));
        let err = loader.load().err().unwrap();
        assert!(matches!(err, BackendError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_garbage_model_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = b"not really onnx";
        std::fs::write(dir.path().join("model.onnx"), bytes).unwrap();

        let loader =
            OnnxSentimentLoader::from_dir(dir.path()).with_checksum(Some(compute_checksum(bytes)));
        let err = loader.load().err().unwrap();
        assert!(matches!(err, BackendError::Load(_)));
    }
}
