//! Server configuration
//!
//! Loaded from a TOML file when one is given, defaults otherwise, then
//! overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use txt2kg_extractor::ExtractorConfig;
use txt2kg_graph::GraphDbConfig;
use txt2kg_llm::{BatchConfig, LlmConfig};
use txt2kg_vector::VectorConfig;

/// Default remote WebGPU clustering service
pub const DEFAULT_REMOTE_WEBGPU_URL: &str = "http://txt2kg-remote-webgpu:8083";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub bind_address: String,

    /// Bind port
    pub port: u16,

    /// JSONL file receiving query logs
    pub query_log_path: PathBuf,

    /// Base URL of the remote WebGPU clustering service
    pub remote_webgpu_url: String,

    /// LLM providers
    pub llm: LlmConfig,

    /// Chunking and extraction
    pub extractor: ExtractorConfig,

    /// Batch extraction
    pub batch: BatchConfig,

    /// Graph databases
    pub graph: GraphDbConfig,

    /// Embeddings and vector index
    pub vector: VectorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            query_log_path: PathBuf::from("data/query-log.jsonl"),
            remote_webgpu_url: DEFAULT_REMOTE_WEBGPU_URL.to_string(),
            llm: LlmConfig::default(),
            extractor: ExtractorConfig::default(),
            batch: BatchConfig::default(),
            graph: GraphDbConfig::default(),
            vector: VectorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// File (or defaults), then environment, then validation
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides from an arbitrary lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("BIND_ADDRESS") {
            self.bind_address = v;
        }
        if let Some(port) = lookup("PORT").and_then(|v| v.parse().ok()) {
            self.port = port;
        }
        if let Some(v) = lookup("QUERY_LOG_PATH") {
            self.query_log_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("REMOTE_WEBGPU_SERVICE_URL") {
            self.remote_webgpu_url = v;
        }
        self.llm.apply_env_with(&lookup);
        self.graph.apply_env_with(&lookup);
        self.vector.apply_env_with(&lookup);
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_address must not be empty".to_string()));
        }
        self.llm.validate().map_err(ConfigError::Invalid)?;
        self.extractor.validate().map_err(ConfigError::Invalid)?;
        self.batch.validate().map_err(ConfigError::Invalid)?;
        self.graph.validate().map_err(ConfigError::Invalid)?;
        self.vector.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
