use serde::Serialize;
use serde_json::Value;

use super::error::{ProviderError, status_error};
use crate::message::ChatMessage;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct TextGenerationClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl TextGenerationClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Create a completion and return the provider's response object untouched.
    pub async fn create_chat_completion(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
    ) -> Result<Value, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, messages = messages.len(), "requesting chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&CompletionRequest {
                model: &self.model,
                messages,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(response.json::<Value>().await?)
    }
}
