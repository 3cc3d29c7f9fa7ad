//! Error type shared by all graph backends

use thiserror::Error;
use txt2kg_domain::GraphDbType;

/// Errors that can occur during graph database operations
#[derive(Error, Debug)]
pub enum GraphDbError {
    /// Operation attempted before `initialize()` succeeded (or after `close()`)
    #[error("{0} store not initialized. Call initialize() first.")]
    NotInitialized(GraphDbType),

    /// Backend unreachable or the request could not be sent
    #[error("Connection error: {0}")]
    Connection(String),

    /// Backend answered with a non-success status or reported errors
    #[error("Backend error ({status}): {message}")]
    Backend {
        /// HTTP status code (200 for errors reported inside a success body)
        status: u16,
        /// Message returned by the backend
        message: String,
    },

    /// Backend answered with a body we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Connection parameters do not fit the store
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for GraphDbError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GraphDbError::InvalidResponse(e.to_string())
        } else {
            GraphDbError::Connection(e.to_string())
        }
    }
}
