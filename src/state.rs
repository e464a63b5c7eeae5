// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::openai::TextGenerationClient;
use crate::services::replicate::AudioGenerationClient;

pub type SharedState = Arc<AppState>;

/// Read-only after startup; handlers share it without locking.
pub struct AppState {
    pub config: Config,
    pub text: TextGenerationClient,
    pub audio: AudioGenerationClient,
}

impl AppState {
    pub fn new(config: Config) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            text: TextGenerationClient::new(
                http.clone(),
                config.openai_base_url.clone(),
                config.openai_model.clone(),
            ),
            audio: AudioGenerationClient::new(
                http,
                config.replicate_base_url.clone(),
                config.music_model_version.clone(),
                config.poll_interval,
            ),
            config,
        })
    }

    pub fn shared(config: Config) -> reqwest::Result<SharedState> {
        Self::new(config).map(Arc::new)
    }
}
