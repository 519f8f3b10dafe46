use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::data_client::DataError;
use crate::scope::Cancelled;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Messages are the static, screen-level strings a user sees. Backend detail
/// is logged, never returned.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{message}: {source}")]
    Data {
        message: &'static str,
        #[source]
        source: DataError,
    },

    #[error("{message}: {source}")]
    Auth {
        message: &'static str,
        #[source]
        source: AuthError,
    },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<Cancelled> for AppError {
    fn from(_: Cancelled) -> Self {
        AppError::Cancelled
    }
}

/// Attaches the screen-level message shown when a remote call fails.
pub trait OrScreen<T> {
    fn or_screen(self, message: &'static str) -> Result<T, AppError>;
}

impl<T> OrScreen<T> for Result<T, DataError> {
    fn or_screen(self, message: &'static str) -> Result<T, AppError> {
        self.map_err(|source| match source {
            DataError::NotFound { table } => {
                tracing::debug!("No row in {table}: {message}");
                AppError::NotFound(message.to_string())
            }
            source => AppError::Data { message, source },
        })
    }
}

impl<T> OrScreen<T> for Result<T, AuthError> {
    fn or_screen(self, message: &'static str) -> Result<T, AppError> {
        self.map_err(|source| AppError::Auth { message, source })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Data { message, source } => {
                tracing::error!("Data API error ({message}): {source}");
                (StatusCode::BAD_GATEWAY, "BACKEND_ERROR", message.to_string())
            }
            AppError::Auth { message, source } if source.is_credential_failure() => {
                tracing::info!("Auth rejected ({message}): {source}");
                (StatusCode::UNAUTHORIZED, "AUTH_REJECTED", message.to_string())
            }
            AppError::Auth { message, source } => {
                tracing::error!("Auth API error ({message}): {source}");
                (StatusCode::BAD_GATEWAY, "AUTH_ERROR", message.to_string())
            }
            AppError::Cancelled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CANCELLED",
                "The request was cancelled".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
