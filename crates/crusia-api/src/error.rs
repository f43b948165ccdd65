use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crusia_auth::TokenError;
use crusia_core::GatewayError;
use crusia_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiErrorKind {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error("unknown save version {0}")]
    UnknownVersion(i64),
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("unexpected error: {0}")]
    Internal(String),
}

/// A failed request. Renders as `{"status", "error"}` with the matching
/// status code.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct ApiError {
    kind: ApiErrorKind,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        Self::new(ApiErrorKind::BadRequest(message.into()))
    }

    pub fn unauthorized() -> Self {
        Self::new(ApiErrorKind::Unauthorized)
    }

    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::new(ApiErrorKind::Internal(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ApiErrorKind::BadRequest(_)
            | ApiErrorKind::UnknownVersion(_)
            | ApiErrorKind::DecryptionFailed => StatusCode::BAD_REQUEST,
            ApiErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorKind::NotFound => StatusCode::NOT_FOUND,
            ApiErrorKind::Conflict => StatusCode::CONFLICT,
            ApiErrorKind::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Kind indicator sent to the client.
    pub fn code(&self) -> &'static str {
        match self.kind {
            ApiErrorKind::BadRequest(_) => "bad_request",
            ApiErrorKind::Unauthorized => "unauthorized",
            ApiErrorKind::Forbidden => "forbidden",
            ApiErrorKind::NotFound => "not_found",
            ApiErrorKind::Conflict => "conflict",
            ApiErrorKind::UnknownVersion(_) => "unknown_version",
            ApiErrorKind::DecryptionFailed => "decryption_failed",
            ApiErrorKind::Internal(_) => "internal",
        }
    }
}

impl From<ApiErrorKind> for ApiError {
    fn from(kind: ApiErrorKind) -> Self {
        Self::new(kind)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.kind {
            ApiErrorKind::Internal(detail) => error!(%detail, "request failed"),
            other => debug!(error = %other, "request rejected"),
        }

        let body = Json(ErrorBody {
            status: status.as_u16(),
            error: self.code(),
        });
        (status, body).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(value: GatewayError) -> Self {
        let kind = match value {
            GatewayError::UnknownVersion(version) => {
                ApiErrorKind::UnknownVersion(i64::from(version))
            }
            GatewayError::DecryptionFailed => ApiErrorKind::DecryptionFailed,
            GatewayError::EncryptionFailed => ApiErrorKind::Internal(value.to_string()),
        };
        ApiError::new(kind)
    }
}

impl From<TokenError> for ApiError {
    fn from(value: TokenError) -> Self {
        let kind = match value {
            TokenError::Invalid => ApiErrorKind::Unauthorized,
            TokenError::Creation(err) => ApiErrorKind::Internal(err),
        };
        ApiError::new(kind)
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        let kind = match value {
            StoreError::Conflict(_) => ApiErrorKind::Conflict,
            other => ApiErrorKind::Internal(other.to_string()),
        };
        ApiError::new(kind)
    }
}
