// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures surfaced by the HTTP handlers. Every variant renders as a plain
/// text body with a status code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    /// A provider credential is missing from the process configuration.
    #[error("{0}")]
    Misconfigured(String),

    #[error("{0}")]
    BadRequest(String),

    /// Upstream failures and anything unexpected. The cause is logged where
    /// it happens and never sent to the client.
    #[error("Internal Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Misconfigured(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
