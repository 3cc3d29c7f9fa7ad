//! JSON passthrough to the remote WebGPU clustering service

use super::AppState;
use crate::error::{AppError, AppJson};
use axum::extract::{Path, RawQuery, State};
use axum::response::Json;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

fn upstream_url(base: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(q);
    }
    url
}

async fn forward(
    state: &AppState,
    method: Method,
    url: String,
    body: Option<Value>,
) -> Result<Json<Value>, AppError> {
    info!("Proxying {} request to: {}", method, url);
    let mut request = state.http.request(method, &url);
    if let Some(body) = body {
        debug!("Proxy request body: {}", body);
        request = request.json(&body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| AppError::Proxy(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(AppError::Proxy(format!(
            "Remote WebGPU service responded with {}: {}",
            status, text
        )));
    }

    let data = response
        .json::<Value>()
        .await
        .map_err(|e| AppError::Proxy(e.to_string()))?;
    Ok(Json(data))
}

/// GET /api/remote-webgpu/*path
pub async fn proxy_get(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, AppError> {
    let url = upstream_url(&state.config.remote_webgpu_url, &path, query.as_deref());
    forward(&state, Method::GET, url, None).await
}

/// POST /api/remote-webgpu/*path
pub async fn proxy_post(
    State(state): State<AppState>,
    Path(path): Path<String>,
    AppJson(body): AppJson<Value>,
) -> Result<Json<Value>, AppError> {
    let url = upstream_url(&state.config.remote_webgpu_url, &path, None);
    forward(&state, Method::POST, url, Some(body)).await
}

/// DELETE /api/remote-webgpu/*path
pub async fn proxy_delete(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<Value>, AppError> {
    let url = upstream_url(&state.config.remote_webgpu_url, &path, None);
    forward(&state, Method::DELETE, url, None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_url() {
        assert_eq!(
            upstream_url("http://gpu:8083/", "/api/cluster", Some("k=3")),
            "http://gpu:8083/api/cluster?k=3"
        );
        assert_eq!(
            upstream_url("http://gpu:8083", "health", Some("")),
            "http://gpu:8083/health"
        );
    }
}
