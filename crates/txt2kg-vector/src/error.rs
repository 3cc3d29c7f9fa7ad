//! Errors for embedding and vector index operations

use thiserror::Error;

/// Errors that can occur during embedding or vector index operations
#[derive(Error, Debug)]
pub enum VectorError {
    /// Embedding service failed or returned unusable output
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Service unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Service answered with a non-success status
    #[error("Backend error ({status}): {message}")]
    Backend {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Vector length does not match the index
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for VectorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            VectorError::InvalidResponse(e.to_string())
        } else {
            VectorError::Connection(e.to_string())
        }
    }
}

pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, VectorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    Err(VectorError::Backend {
        status: status.as_u16(),
        message,
    })
}
