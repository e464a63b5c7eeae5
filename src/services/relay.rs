//! Prompt relay: validate a caller's payload, forward it to a generative
//! service with the configured credential, and shape the reply.
//!
//! The code, conversation and music endpoints are all instances of
//! [`RelayVariant`]; they differ only in the provider they target and in the
//! two shaping functions.

use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use super::error::ProviderError;
use crate::{
    error::AppError,
    message::{ChatMessage, RelayPayload},
    state::AppState,
};

pub const CODE_INSTRUCTION: &str = "You are a code generator. You must answer only in markdown code snippets. Use code comments for explanations.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Chat completions service.
    Text,
    /// Audio prediction service.
    Audio,
}

/// What gets sent upstream after request shaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamRequest {
    Chat(Vec<ChatMessage>),
    Music { prompt: String },
}

pub struct RelayVariant {
    pub name: &'static str,
    pub provider: Provider,
    pub shape_request: fn(RelayPayload) -> Result<UpstreamRequest, AppError>,
    pub shape_response: fn(Value) -> Result<Value, ProviderError>,
}

pub static CODE: RelayVariant = RelayVariant {
    name: "code",
    provider: Provider::Text,
    shape_request: with_code_instruction,
    shape_response: passthrough,
};

pub static CONVERSATION: RelayVariant = RelayVariant {
    name: "conversation",
    provider: Provider::Text,
    shape_request: messages_as_is,
    shape_response: first_choice_message,
};

pub static MUSIC: RelayVariant = RelayVariant {
    name: "music",
    provider: Provider::Audio,
    shape_request: music_prompt,
    shape_response: passthrough,
};

impl RelayVariant {
    /// Relay a raw JSON body. The credential is checked before the body is
    /// parsed, so a misconfigured server reports that first.
    pub async fn relay_json(&self, state: &AppState, body: &[u8]) -> Result<Value, AppError> {
        let credential = state.config.credential(self.provider)?;
        let payload = RelayPayload::from_json(body)?;
        self.forward(state, credential, payload).await
    }

    pub async fn relay(&self, state: &AppState, payload: RelayPayload) -> Result<Value, AppError> {
        let credential = state.config.credential(self.provider)?;
        self.forward(state, credential, payload).await
    }

    async fn forward(
        &self,
        state: &AppState,
        credential: &str,
        payload: RelayPayload,
    ) -> Result<Value, AppError> {
        let request = (self.shape_request)(payload)?;
        let span = tracing::info_span!("relay", variant = self.name, request_id = %Uuid::new_v4());

        async move {
            let reply = match &request {
                UpstreamRequest::Chat(messages) => {
                    state.text.create_chat_completion(credential, messages).await
                }
                UpstreamRequest::Music { prompt } => state.audio.run(credential, prompt).await,
            };

            match reply.and_then(self.shape_response) {
                Ok(body) => {
                    tracing::info!("relay completed");
                    Ok(body)
                }
                Err(e) => {
                    tracing::error!("[{}_ERROR] {e}", self.name.to_uppercase());
                    Err(AppError::Internal(e.into()))
                }
            }
        }
        .instrument(span)
        .await
    }
}

fn require_messages(payload: RelayPayload) -> Result<Vec<ChatMessage>, AppError> {
    payload
        .messages
        .ok_or_else(|| AppError::BadRequest("Messages are required".to_string()))
}

fn with_code_instruction(payload: RelayPayload) -> Result<UpstreamRequest, AppError> {
    let messages = require_messages(payload)?;
    let mut forwarded = Vec::with_capacity(messages.len() + 1);
    forwarded.push(ChatMessage::system(CODE_INSTRUCTION));
    forwarded.extend(messages);
    Ok(UpstreamRequest::Chat(forwarded))
}

// An empty but present list is forwarded; the provider decides what it means.
fn messages_as_is(payload: RelayPayload) -> Result<UpstreamRequest, AppError> {
    require_messages(payload).map(UpstreamRequest::Chat)
}

fn music_prompt(payload: RelayPayload) -> Result<UpstreamRequest, AppError> {
    match payload.prompt {
        Some(prompt) if !prompt.trim().is_empty() => Ok(UpstreamRequest::Music {
            prompt: prompt.trim().to_string(),
        }),
        _ => Err(AppError::BadRequest("Prompt is required".to_string())),
    }
}

fn passthrough(body: Value) -> Result<Value, ProviderError> {
    Ok(body)
}

/// The message of the first choice in a chat completion object.
pub fn first_choice(mut body: Value) -> Result<ChatMessage, ProviderError> {
    let message = body
        .pointer_mut("/choices/0/message")
        .map(Value::take)
        .ok_or(ProviderError::MissingField("choices[0].message"))?;
    Ok(serde_json::from_value(message)?)
}

/// Reduce a completion object to its first `{role, content}` message.
fn first_choice_message(body: Value) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(first_choice(body)?)?)
}
