//! Provider selection and per-request overrides

use crate::{LlmError, LlmProvider, OllamaProvider, OpenAiCompatibleProvider};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Which LLM backend to call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// Local Ollama server
    #[default]
    Ollama,
    /// NVIDIA hosted API
    Nvidia,
    /// Local vLLM server
    Vllm,
}

impl LlmProviderKind {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProviderKind::Ollama => "ollama",
            LlmProviderKind::Nvidia => "nvidia",
            LlmProviderKind::Vllm => "vllm",
        }
    }
}

impl fmt::Display for LlmProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(LlmProviderKind::Ollama),
            "nvidia" => Ok(LlmProviderKind::Nvidia),
            "vllm" => Ok(LlmProviderKind::Vllm),
            other => Err(LlmError::Config(format!("unknown LLM provider: {}", other))),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider used when a request does not name one
    pub provider: LlmProviderKind,
    /// Ollama server URL
    pub ollama_base_url: String,
    /// Ollama model
    pub ollama_model: String,
    /// NVIDIA API base URL
    pub nvidia_base_url: String,
    /// NVIDIA API key
    pub nvidia_api_key: Option<String>,
    /// NVIDIA model
    pub nvidia_model: String,
    /// vLLM server URL (including `/v1`)
    pub vllm_base_url: String,
    /// vLLM model
    pub vllm_model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Attempts per completion before giving up
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Ollama,
            ollama_base_url: crate::ollama::DEFAULT_ENDPOINT.to_string(),
            ollama_model: "llama3.1:8b".to_string(),
            nvidia_base_url: crate::openai::NVIDIA_BASE_URL.to_string(),
            nvidia_api_key: None,
            nvidia_model: "meta/llama-3.1-70b-instruct".to_string(),
            vllm_base_url: crate::openai::VLLM_BASE_URL.to_string(),
            vllm_model: "meta-llama/Llama-3.2-3B-Instruct".to_string(),
            timeout_secs: crate::ollama::DEFAULT_TIMEOUT_SECS,
            max_retries: crate::ollama::DEFAULT_MAX_RETRIES,
        }
    }
}

/// Request-scoped provider choices; `None` keeps the configured value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmOverrides {
    /// Provider to use
    pub provider: Option<LlmProviderKind>,
    /// Ollama model
    pub ollama_model: Option<String>,
    /// Ollama URL
    pub ollama_base_url: Option<String>,
    /// vLLM model
    pub vllm_model: Option<String>,
    /// vLLM URL
    pub vllm_base_url: Option<String>,
    /// NVIDIA model
    pub nvidia_model: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl LlmConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be at least 1".to_string());
        }
        for (name, url) in [
            ("ollama_base_url", &self.ollama_base_url),
            ("nvidia_base_url", &self.nvidia_base_url),
            ("vllm_base_url", &self.vllm_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("{} must be an http(s) URL", name));
            }
        }
        Ok(())
    }

    /// Apply `LLM_PROVIDER`, `OLLAMA_*`, `NVIDIA_*` and `VLLM_*` variables
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides from an arbitrary lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(kind) = lookup("LLM_PROVIDER").and_then(|v| v.parse().ok()) {
            self.provider = kind;
        }
        if let Some(v) = lookup("OLLAMA_BASE_URL") {
            self.ollama_base_url = v;
        }
        if let Some(v) = lookup("OLLAMA_MODEL") {
            self.ollama_model = v;
        }
        if let Some(v) = lookup("NVIDIA_API_KEY") {
            self.nvidia_api_key = Some(v);
        }
        if let Some(v) = lookup("NVIDIA_MODEL") {
            self.nvidia_model = v;
        }
        if let Some(v) = lookup("VLLM_BASE_URL") {
            self.vllm_base_url = v;
        }
        if let Some(v) = lookup("VLLM_MODEL") {
            self.vllm_model = v;
        }
    }

    /// Copy of this config with request overrides applied
    pub fn with_overrides(&self, overrides: &LlmOverrides) -> Self {
        let mut config = self.clone();
        if let Some(kind) = overrides.provider {
            config.provider = kind;
        }
        if let Some(v) = non_blank(&overrides.ollama_model) {
            config.ollama_model = v;
        }
        if let Some(v) = non_blank(&overrides.ollama_base_url) {
            config.ollama_base_url = v;
        }
        if let Some(v) = non_blank(&overrides.vllm_model) {
            config.vllm_model = v;
        }
        if let Some(v) = non_blank(&overrides.vllm_base_url) {
            config.vllm_base_url = v;
        }
        if let Some(v) = non_blank(&overrides.nvidia_model) {
            config.nvidia_model = v;
        }
        config
    }

    /// Model name of the selected provider
    pub fn active_model(&self) -> &str {
        match self.provider {
            LlmProviderKind::Ollama => &self.ollama_model,
            LlmProviderKind::Nvidia => &self.nvidia_model,
            LlmProviderKind::Vllm => &self.vllm_model,
        }
    }

    /// Ollama provider regardless of the selected kind (for connection tests)
    pub fn ollama_provider(&self) -> OllamaProvider {
        OllamaProvider::new(&self.ollama_base_url, &self.ollama_model)
            .with_timeout(self.timeout_secs)
            .with_max_retries(self.max_retries)
    }

    /// Build the selected provider
    pub fn build_provider(&self) -> Result<Arc<dyn LlmProvider>, LlmError> {
        let provider: Arc<dyn LlmProvider> = match self.provider {
            LlmProviderKind::Ollama => Arc::new(self.ollama_provider()),
            LlmProviderKind::Nvidia => {
                let key = non_blank(&self.nvidia_api_key)
                    .ok_or_else(|| LlmError::Config("NVIDIA_API_KEY is not set".to_string()))?;
                Arc::new(
                    OpenAiCompatibleProvider::nvidia(key, &self.nvidia_model)
                        .with_base_url(&self.nvidia_base_url)
                        .with_timeout(self.timeout_secs)
                        .with_max_retries(self.max_retries),
                )
            }
            LlmProviderKind::Vllm => Arc::new(
                OpenAiCompatibleProvider::vllm(&self.vllm_base_url, &self.vllm_model)
                    .with_timeout(self.timeout_secs)
                    .with_max_retries(self.max_retries),
            ),
        };
        Ok(provider)
    }
}
