//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use serving_core::{ComponentStatus, InferenceResult};
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Row for prediction tables
#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Input")]
    input: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Latency")]
    latency: String,
}

/// Print prediction results as a table or JSON array
pub fn print_predictions(results: &[InferenceResult], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if results.is_empty() {
                println!("{}", "No predictions".yellow());
                return;
            }
            let rows: Vec<PredictionRow> = results
                .iter()
                .map(|r| PredictionRow {
                    input: truncate(r.input_text(), 48),
                    label: color_label(r.label()),
                    confidence: color_confidence(r.confidence()),
                    latency: format_latency(r.latency_seconds()),
                })
                .collect();
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(results),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format confidence as percentage
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.2}%", confidence * 100.0)
}

/// Format latency in milliseconds
pub fn format_latency(seconds: f64) -> String {
    format!("{:.1}ms", seconds * 1000.0)
}

/// Color confidence based on value
pub fn color_confidence(confidence: f64) -> String {
    let formatted = format_confidence(confidence);
    if confidence >= 0.9 {
        formatted.green().to_string()
    } else if confidence >= 0.6 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

pub fn color_label(label: &str) -> String {
    match label.to_uppercase().as_str() {
        "POSITIVE" => label.green().to_string(),
        "NEGATIVE" => label.red().to_string(),
        _ => label.to_string(),
    }
}

pub fn color_status(status: ComponentStatus) -> String {
    match status {
        ComponentStatus::Healthy => "healthy".green().to_string(),
        ComponentStatus::Degraded => "degraded".yellow().to_string(),
        ComponentStatus::Unhealthy => "unhealthy".red().to_string(),
    }
}

/// Shorten long inputs for table display
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", head)
}
