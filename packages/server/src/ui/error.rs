//! HTTP API error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::infrastructure::dto::http::ErrorResponse;
use crate::usecase::{ErrorKind, UseCaseError};

/// Error type returned by every REST handler.
///
/// Maps the usecase error taxonomy onto HTTP status codes so clients can
/// tell "doesn't exist" (404) from "exists but not yours" (403).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    UseCase(#[from] UseCaseError),

    #[error("caller identity header (X-User-Id) is required")]
    MissingCallerIdentity,

    #[error("caller identity does not match the requested resource")]
    CallerMismatch,

    #[error("destructive operation requires explicit confirmation (confirm=true)")]
    ConfirmationRequired,

    #[error("rating must be between 1 and 5")]
    InvalidRating,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::UseCase(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::MissingCallerIdentity
            | ApiError::ConfirmationRequired
            | ApiError::InvalidRating => StatusCode::BAD_REQUEST,
            ApiError::CallerMismatch => StatusCode::FORBIDDEN,
        }
    }
}

impl From<crate::domain::DomainError> for ApiError {
    fn from(e: crate::domain::DomainError) -> Self {
        ApiError::UseCase(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // 永続化エラーの詳細はサーバー側のログにのみ残す
            tracing::error!("Internal error: {}", self);
            let body = ErrorResponse {
                success: false,
                error: "internal server error".to_string(),
            };
            return (status, Json(body)).into_response();
        }
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
