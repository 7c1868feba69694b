//! API client for communicating with the sentiment server

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serving_core::{HealthResponse, InferenceResult};
use thiserror::Error;
use url::Url;

/// Error returned by the server with a non-success status
#[derive(Debug, Error)]
#[error("API error ({status}): {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub category: Option<String>,
}

/// Error body produced by `/predict`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest<'a> {
    pub text: &'a str,
}

/// API client for the sentiment server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// Classify one text
    pub async fn predict(&self, text: &str) -> Result<InferenceResult> {
        self.post("predict", &PredictRequest { text }).await
    }

    /// Fetch health; a 503 still carries a health body
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.base_url.join("health").context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return response.json().await.context("Failed to parse response");
        }
        Self::decode(response).await
    }

    /// Fetch API info
    pub async fn info(&self) -> Result<serde_json::Value> {
        self.get("").await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (message, category) = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) => (parsed.error, parsed.category),
                Err(_) => (body, None),
            };
            return Err(ApiError {
                status,
                message,
                category,
            }
            .into());
        }

        response.json().await.context("Failed to parse response")
    }
}
