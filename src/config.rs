// src/config.rs
use std::{fmt, net::SocketAddr, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::{error::AppError, services::relay::Provider};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_REPLICATE_BASE_URL: &str = "https://api.replicate.com/v1";
/// riffusion/riffusion
pub const DEFAULT_MUSIC_VERSION: &str =
    "8cf61ea6c56afd61d8f5b9ffd14d7c216c0a93844ce2d82ac1c9ecc9c7f24e05";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Process configuration. Credentials are optional here: their absence is
/// reported per request, not at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub replicate_api_token: Option<String>,
    pub replicate_base_url: String,
    pub music_model_version: String,
    pub poll_interval: Duration,
    pub subscription_url: String,
    pub public_dir: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("replicate_api_token", &self.replicate_api_token.as_ref().map(|_| "<redacted>"))
            .field("replicate_base_url", &self.replicate_base_url)
            .field("music_model_version", &self.music_model_version)
            .field("poll_interval", &self.poll_interval)
            .field("subscription_url", &self.subscription_url)
            .field("public_dir", &self.public_dir)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            replicate_api_token: None,
            replicate_base_url: DEFAULT_REPLICATE_BASE_URL.to_string(),
            music_model_version: DEFAULT_MUSIC_VERSION.to_string(),
            poll_interval: Duration::from_secs(1),
            subscription_url: "/".to_string(),
            public_dir: PathBuf::from("public"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset and blank values fall back
    /// to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.bind_addr,
        };

        let poll_interval = match get("REPLICATE_POLL_INTERVAL_MS") {
            Some(raw) => {
                let millis = raw.parse::<u64>().map_err(|e| {
                    ConfigError::Invalid {
                        key: "REPLICATE_POLL_INTERVAL_MS",
                        value: raw.clone(),
                        reason: e.to_string(),
                    }
                })?;
                Duration::from_millis(millis)
            }
            None => defaults.poll_interval,
        };

        Ok(Self {
            bind_addr,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            replicate_api_token: get("REPLICATE_API_TOKEN"),
            replicate_base_url: get("REPLICATE_BASE_URL").unwrap_or(defaults.replicate_base_url),
            music_model_version: get("REPLICATE_MUSIC_VERSION")
                .unwrap_or(defaults.music_model_version),
            poll_interval,
            subscription_url: get("SUBSCRIPTION_URL").unwrap_or(defaults.subscription_url),
            public_dir: get("PUBLIC_DIR").map(PathBuf::from).unwrap_or(defaults.public_dir),
        })
    }

    /// The credential for `provider`, or the "not configured" error the
    /// relay reports to its caller.
    pub fn credential(&self, provider: Provider) -> Result<&str, AppError> {
        let (value, message) = match provider {
            Provider::Text => (&self.openai_api_key, "OpenAI API Key not configured."),
            Provider::Audio => (&self.replicate_api_token, "Replicate API Token not configured."),
        };
        value
            .as_deref()
            .ok_or_else(|| AppError::Misconfigured(message.to_string()))
    }
}
