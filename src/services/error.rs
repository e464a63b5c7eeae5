use thiserror::Error;

/// Errors raised while talking to a generative service.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("prediction {id} ended with status {status}: {detail}")]
    PredictionFailed {
        id: String,
        status: String,
        detail: String,
    },

    #[error("provider response is missing {0}")]
    MissingField(&'static str),
}

/// Turn a non-success response into a `ProviderError::Status`.
pub(crate) async fn status_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ProviderError::Status { status, body }
}
