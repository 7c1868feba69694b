//! Sentiment Analysis CLI
//!
//! Sends texts to a running sentiment server, checks its health, or loads a
//! model in-process to try it out without a server.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::local::LocalBackend;
use commands::{local, remote};
use std::path::PathBuf;

/// Sentiment Analysis CLI
#[derive(Parser)]
#[command(name = "sentiment")]
#[command(author, version, about = "CLI for the Sentiment Analysis API", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via SENTIMENT_URL env var)
    #[arg(long, env = "SENTIMENT_URL", default_value = "http://localhost:8080")]
    pub url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify one or more texts with the server
    Predict {
        /// Texts to classify
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Show server health
    Health,

    /// Show API info
    Info,

    /// Load a model in-process and classify texts without a server
    Local {
        /// Backend to load
        #[arg(long, value_enum, default_value = "onnx")]
        backend: LocalBackend,

        /// Directory holding model.onnx and tokenizer.json
        #[arg(long, env = "SENTIMENT_MODEL_DIR", default_value = "models/distilbert-sst2")]
        model_dir: PathBuf,

        /// Texts to classify (defaults to built-in samples)
        texts: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = cli.format;
    let api_client = || client::ApiClient::new(&cli.url);

    let outcome = match cli.command {
        Commands::Predict { texts } => remote::predict(&api_client()?, &texts, format).await,
        Commands::Health => remote::health(&api_client()?, format).await,
        Commands::Info => remote::info(&api_client()?, format).await,
        Commands::Local {
            backend,
            model_dir,
            texts,
        } => tokio::task::spawn_blocking(move || local::run(backend, &model_dir, &texts, format))
            .await?,
    };

    if let Err(err) = &outcome {
        output::print_error(&format!("{:#}", err));
        if let Some(category) = err
            .downcast_ref::<client::ApiError>()
            .and_then(|e| e.category.as_deref())
        {
            output::print_info(&format!("Error category: {}", category));
        }
        std::process::exit(1);
    }

    Ok(())
}
