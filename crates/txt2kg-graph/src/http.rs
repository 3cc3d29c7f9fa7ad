//! Small helpers shared by the HTTP-based backends

use crate::error::GraphDbError;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::warn;

const REQUEST_TIMEOUT_SECS: u64 = 60;

pub(crate) fn build_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}

/// Attach basic auth when both credentials are present
pub(crate) fn with_auth(
    request: RequestBuilder,
    username: Option<&str>,
    password: Option<&str>,
) -> RequestBuilder {
    match (username, password) {
        (Some(user), Some(pass)) => request.basic_auth(user, Some(pass)),
        _ => request,
    }
}

/// Turn a non-2xx response into `GraphDbError::Backend`
pub(crate) async fn check_status(response: Response) -> Result<Response, GraphDbError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    Err(GraphDbError::Backend {
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
