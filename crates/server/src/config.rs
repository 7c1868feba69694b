//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use serving_core::backend::DEFAULT_LABELS;
use serving_core::{BackendLoader, LexiconLoader, OnnxSentimentLoader};
use std::path::PathBuf;

/// Which inference backend to load at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// DistilBERT SST-2 exported to ONNX
    Onnx,
    /// Built-in word-list classifier
    Lexicon,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    /// Directory holding `model.onnx` and `tokenizer.json`
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Expected SHA-256 of `model.onnx`, hex encoded
    #[serde(default)]
    pub model_sha256: Option<String>,

    /// Token budget per input, including [CLS] and [SEP]
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,

    /// Output labels in logit order
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_backend() -> BackendKind {
    BackendKind::Onnx
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models/distilbert-sst2")
}

fn default_max_sequence_length() -> usize {
    128
}

fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|l| l.to_string()).collect()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backend: default_backend(),
            model_dir: default_model_dir(),
            model_sha256: None,
            max_sequence_length: default_max_sequence_length(),
            labels: default_labels(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `SENTIMENT_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("SENTIMENT")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("labels"),
            )
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid SENTIMENT_* configuration")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the loader for the configured backend
    pub fn backend_loader(&self) -> Box<dyn BackendLoader> {
        match self.backend {
            BackendKind::Onnx => Box::new(
                OnnxSentimentLoader::from_dir(&self.model_dir)
                    .with_labels(self.labels.clone())
                    .with_max_sequence_length(self.max_sequence_length)
                    .with_checksum(self.model_sha256.clone()),
            ),
            BackendKind::Lexicon => Box::new(LexiconLoader::new()),
        }
    }
}
