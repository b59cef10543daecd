use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::core::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl WebError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::InvalidId(_)) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::Timeout(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, WebError>;

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, code) = match self {
            Self::Validation(msg) => (msg, "input_error"),
            Self::NotFound(msg) => (msg, "not_found"),
            Self::Store(StoreError::NotFound { .. }) => ("not found".to_string(), "not_found"),
            Self::Store(StoreError::InvalidId(raw)) => {
                (format!("invalid id: {}", raw), "input_error")
            }
            Self::Store(err @ StoreError::Timeout(_)) => {
                error!(error = %err, "store deadline exceeded");
                ("storage unavailable".to_string(), "unavailable")
            }
            // Internal detail goes to the log, never to the caller.
            Self::Store(err) => {
                error!(error = %err, "store error");
                ("internal server error".to_string(), "internal_error")
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
