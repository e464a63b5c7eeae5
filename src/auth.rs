// src/auth.rs
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the user id, set by the identity-aware proxy in front of
/// this service.
pub const IDENTITY_HEADER: &str = "x-user-id";

/// The authenticated caller. Extraction fails with 401 before the request
/// body is read, so unauthenticated calls are rejected whatever they carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| CallerIdentity(id.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<CallerIdentity, AppError> {
        let mut builder = Request::builder().uri("/api/code");
        if let Some(value) = header {
            builder = builder.header(IDENTITY_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CallerIdentity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_user_id_header() {
        assert_eq!(extract(Some("user_42")).await.unwrap(), CallerIdentity("user_42".into()));
    }

    #[tokio::test]
    async fn missing_or_blank_identity_is_unauthorized() {
        assert!(matches!(extract(None).await, Err(AppError::Unauthorized)));
        assert!(matches!(extract(Some("  ")).await, Err(AppError::Unauthorized)));
    }
}
