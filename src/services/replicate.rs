use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};

use super::error::{ProviderError, status_error};

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Value,
}

impl Prediction {
    fn is_running(&self) -> bool {
        matches!(self.status.as_str(), "starting" | "processing")
    }
}

/// Client for Replicate's predictions API, pinned to one model version.
#[derive(Debug, Clone)]
pub struct AudioGenerationClient {
    http: reqwest::Client,
    base_url: String,
    version: String,
    poll_interval: Duration,
}

impl AudioGenerationClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        version: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            version: version.into(),
            poll_interval,
        }
    }

    /// Run one prediction to completion and return its `output`.
    ///
    /// The create call asks the provider to hold the connection until the
    /// prediction settles; if it is still running afterwards the prediction
    /// is polled until it reaches a terminal status.
    pub async fn run(&self, token: &str, prompt: &str) -> Result<Value, ProviderError> {
        let body = json!({
            "version": self.version,
            "input": { "prompt_a": prompt },
        });

        let response = self
            .http
            .post(format!("{}/predictions", self.base_url))
            .bearer_auth(token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let mut prediction: Prediction = response.json().await?;
        tracing::debug!(id = %prediction.id, status = %prediction.status, "prediction created");

        while prediction.is_running() {
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.fetch(token, &prediction.id).await?;
            tracing::debug!(id = %prediction.id, status = %prediction.status, "prediction polled");
        }

        match prediction.status.as_str() {
            "succeeded" => Ok(prediction.output),
            _ => Err(ProviderError::PredictionFailed {
                detail: match prediction.error {
                    Value::String(s) => s,
                    Value::Null => "no detail".to_string(),
                    other => other.to_string(),
                },
                id: prediction.id,
                status: prediction.status,
            }),
        }
    }

    async fn fetch(&self, token: &str, id: &str) -> Result<Prediction, ProviderError> {
        let response = self
            .http
            .get(format!("{}/predictions/{id}", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(response.json().await?)
    }
}
