//! HTTP error mapping

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;
use tracing::error;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Upstream detail, for proxy failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// The request is malformed or incomplete (400)
    #[error("{0}")]
    BadRequest(String),

    /// A backend or the pipeline failed (500)
    #[error("{0}")]
    Internal(String),

    /// The remote WebGPU service failed (500)
    #[error("Failed to communicate with remote WebGPU service")]
    Proxy(String),
}

impl AppError {
    /// Internal error prefixed with what was being attempted
    pub fn internal(context: &str, err: impl Display) -> Self {
        AppError::Internal(format!("{}: {}", context, err))
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) | AppError::Proxy(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// JSON body extractor whose rejections use the `{error}` envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }

        let body = match self {
            AppError::Proxy(details) => ErrorResponse {
                error: "Failed to communicate with remote WebGPU service".to_string(),
                details: Some(details),
            },
            other => ErrorResponse {
                error: other.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
