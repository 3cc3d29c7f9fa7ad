//! OpenAI-compatible chat completions
//!
//! NVIDIA's hosted inference endpoints and local vLLM servers both speak the
//! OpenAI `/chat/completions` dialect, so one provider serves both. The only
//! differences are the base URL, the provider name and whether a bearer key
//! is sent.

use crate::ollama::{build_client, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use crate::{ChatMessage, CompletionOptions, LlmError, LlmProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// NVIDIA hosted API base URL
pub const NVIDIA_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";

/// Default local vLLM base URL
pub const VLLM_BASE_URL: &str = "http://localhost:8001/v1";

/// Provider for any server exposing `POST {base_url}/chat/completions`
pub struct OpenAiCompatibleProvider {
    name: String,
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Create a provider with an explicit name and base URL
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            client: build_client(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// NVIDIA hosted endpoint; the API key is required
    pub fn nvidia(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("nvidia", NVIDIA_BASE_URL, model).with_api_key(api_key)
    }

    /// Local vLLM server
    pub fn vllm(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("vllm", base_url, model)
    }

    /// Send `Authorization: Bearer <key>` with every request
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.client = build_client(timeout_secs);
        self
    }

    async fn send_once(&self, body: &ChatCompletionRequest<'_>) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, text)));
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))
    }
}

fn is_retryable(err: &LlmError) -> bool {
    matches!(err, LlmError::Communication(_) | LlmError::RateLimitExceeded)
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        if self.name == "nvidia" && self.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(LlmError::Config("NVIDIA_API_KEY is not set".to_string()));
        }

        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };

        let mut attempts = 0;
        loop {
            match self.send_once(&body).await {
                Ok(content) => {
                    debug!(provider = %self.name, model = %self.model, chars = content.len(), "Chat completion");
                    return Ok(content);
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= self.max_retries || !is_retryable(&e) {
                        return Err(e);
                    }
                    let delay = Duration::from_secs(2u64.pow(attempts - 1));
                    warn!(provider = %self.name, attempt = attempts, ?delay, error = %e, "Retrying completion");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }
}
