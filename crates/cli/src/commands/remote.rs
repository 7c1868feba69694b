//! Commands that talk to a running sentiment server

use anyhow::Result;
use colored::Colorize;

use crate::client::ApiClient;
use crate::output::{color_status, print_info, print_json, print_predictions, OutputFormat};

/// Classify each text through `/predict`
pub async fn predict(client: &ApiClient, texts: &[String], format: OutputFormat) -> Result<()> {
    let mut results = Vec::with_capacity(texts.len());
    for text in texts {
        results.push(client.predict(text).await?);
    }
    print_predictions(&results, format);
    Ok(())
}

/// Show server health
pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health),
        OutputFormat::Table => {
            println!("{}", "Server Health".bold());
            println!("{}", "=".repeat(40));
            println!("Status:      {}", color_status(health.status));
            println!("Model state: {}", health.model_state.to_string().cyan());
            if let Some(secs) = health.load_time_seconds {
                println!("Load time:   {:.2}s", secs);
            }
            if let Some(reason) = &health.reason {
                println!("Reason:      {}", reason.yellow());
            }
        }
    }

    if !health.status.is_serving() {
        anyhow::bail!("server is not ready to serve predictions");
    }
    Ok(())
}

/// Show API info
pub async fn info(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info = client.info().await?;

    match format {
        OutputFormat::Json => print_json(&info),
        OutputFormat::Table => {
            let name = info["name"].as_str().unwrap_or("unknown");
            println!("{}", name.bold());
            if let Some(endpoints) = info["endpoints"].as_object() {
                for (path, description) in endpoints {
                    println!("  {:<10} {}", path.cyan(), description.as_str().unwrap_or(""));
                }
            }
            print_info(r#"Example: sentiment predict "I love this product!""#);
        }
    }

    Ok(())
}
