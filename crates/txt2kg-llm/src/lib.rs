//! txt2kg LLM Provider Layer
//!
//! Pluggable chat-completion providers used by the triple extraction pipeline.
//!
//! # Architecture
//!
//! Every backend implements the async [`LlmProvider`] trait, which takes a list
//! of chat messages and returns the assistant's text. Callers hold providers as
//! `Arc<dyn LlmProvider>` so the concrete backend is chosen at runtime from
//! [`LlmConfig`].
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama `/api/chat` integration
//! - `OpenAiCompatibleProvider`: NVIDIA hosted endpoints and vLLM servers
//!
//! The [`batch`] module runs many completions with a concurrency cap and
//! per-item retry.
//!
//! # Examples
//!
//! ```
//! use txt2kg_llm::{ChatMessage, CompletionOptions, LlmProvider, MockProvider};
//!
//! # tokio_test_block_on(async {
//! let provider = MockProvider::new("Hello from LLM!");
//! let messages = vec![ChatMessage::user("test prompt")];
//! let result = provider.complete(&messages, &CompletionOptions::default()).await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]

pub mod batch;
pub mod config;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use batch::{BatchConfig, BatchItemResult, BatchProcessor};
pub use config::{LlmConfig, LlmOverrides, LlmProviderKind};
pub use ollama::OllamaProvider;
pub use openai::OpenAiCompatibleProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider is missing required configuration (e.g. an API key)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// True when the same request may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LlmError::ModelNotAvailable(_) | LlmError::Config(_))
    }
}

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions framing the conversation
    System,
    /// The caller
    User,
    /// The model
    Assistant,
}

/// One chat message in the wire shape shared by Ollama and OpenAI-compatible APIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who is speaking
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters for a completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 8192,
        }
    }
}

/// A chat-completion backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion and return the assistant text
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;

    /// Short provider name (`ollama`, `nvidia`, `vllm`, `mock`)
    fn name(&self) -> &str;

    /// Model identifier sent to the backend
    fn model(&self) -> &str;
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network calls.
/// A registered response is used when its key occurs in the last user message;
/// keys are checked in registration order.
///
/// # Examples
///
/// ```
/// use txt2kg_llm::{ChatMessage, CompletionOptions, LlmProvider, MockProvider};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut provider = MockProvider::default();
/// provider.add_response("alpha", "response1");
/// let opts = CompletionOptions::default();
/// let out = provider.complete(&[ChatMessage::user("text about alpha")], &opts).await.unwrap();
/// assert_eq!(out, "response1");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<Vec<(String, String)>>>,
    call_count: Arc<Mutex<usize>>,
    recorded: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

const MOCK_ERROR: &str = "ERROR";

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Return `response` whenever the last user message contains `key`
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push((key.into(), response.into()));
        }
    }

    /// Fail whenever the last user message contains `key`
    pub fn add_error(&mut self, key: impl Into<String>) {
        self.add_response(key, MOCK_ERROR);
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.call_count.lock().map(|c| *c).unwrap_or(0)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        if let Ok(mut count) = self.call_count.lock() {
            *count = 0;
        }
    }

    /// Every message list passed to `complete`, in call order
    pub fn recorded_messages(&self) -> Vec<Vec<ChatMessage>> {
        self.recorded.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        if let Ok(mut count) = self.call_count.lock() {
            *count += 1;
        }
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.push(messages.to_vec());
        }

        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let responses = self
            .responses
            .lock()
            .map_err(|_| LlmError::Other("mock state poisoned".to_string()))?;
        if let Some((_, response)) = responses.iter().find(|(key, _)| prompt.contains(key.as_str())) {
            if response == MOCK_ERROR {
                return Err(LlmError::Other("Mock error".to_string()));
            }
            return Ok(response.clone());
        }

        Ok(self.default_response.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
