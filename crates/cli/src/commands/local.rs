//! In-process model run through the load/predict contract
//!
//! Loads the model the way a hosting platform would (once, up front) and
//! classifies a batch of inputs without starting a server.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde_json::json;
use serving_core::{
    BackendLoader, HostedModel, LexiconLoader, ModelLifecycle, ModelState, OnnxSentimentLoader,
    ServingModel,
};
use std::path::Path;
use std::sync::Arc;

use crate::output::{print_predictions, print_success, OutputFormat};

/// Inputs used when none are given on the command line
pub const SAMPLE_INPUTS: [&str; 5] = [
    "I love this product! It's amazing!",
    "This is terrible and I hate it.",
    "The weather is okay today.",
    "Best purchase I've ever made!",
    "Worst experience of my life.",
];

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LocalBackend {
    /// ONNX model from --model-dir
    #[default]
    Onnx,
    /// Built-in word-list classifier
    Lexicon,
}

fn loader(backend: LocalBackend, model_dir: &Path) -> Box<dyn BackendLoader> {
    match backend {
        LocalBackend::Onnx => Box::new(OnnxSentimentLoader::from_dir(model_dir)),
        LocalBackend::Lexicon => Box::new(LexiconLoader::new()),
    }
}

/// Load a model in-process and classify `texts` (or the sample inputs)
pub fn run(
    backend: LocalBackend,
    model_dir: &Path,
    texts: &[String],
    format: OutputFormat,
) -> Result<()> {
    let model = HostedModel::new(Arc::new(ModelLifecycle::from_boxed(loader(
        backend, model_dir,
    ))));

    let state = model.load();
    if state != ModelState::Ready {
        let reason = model
            .lifecycle()
            .failure_reason()
            .unwrap_or_else(|| "unknown error".to_string());
        anyhow::bail!("model did not load ({state}): {reason}");
    }

    if matches!(format, OutputFormat::Table) {
        let secs = model
            .lifecycle()
            .load_duration()
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        print_success(&format!("Model loaded in {:.2} seconds", secs));
    }

    let inputs: Vec<&str> = if texts.is_empty() {
        SAMPLE_INPUTS.to_vec()
    } else {
        texts.iter().map(String::as_str).collect()
    };

    let results = inputs
        .iter()
        .map(|text| {
            model
                .predict(&json!({ "text": text }))
                .with_context(|| format!("prediction failed for {text:?}"))
        })
        .collect::<Result<Vec<_>>>()?;

    print_predictions(&results, format);
    Ok(())
}
