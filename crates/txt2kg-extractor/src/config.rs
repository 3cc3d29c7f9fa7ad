//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text chunking strategy for large documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Fixed-size windows split at sentence ends, optional overlap
    #[default]
    PyG,
    /// Large sentence-bounded chunks for long-context models, no overlap
    Sentence,
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Text chunking strategy
    pub chunk_strategy: ChunkStrategy,

    /// Maximum chunk size (characters)
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks (PyG strategy only)
    pub overlap_size: usize,

    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Maximum time for one whole extraction, all chunks included (seconds)
    pub extraction_timeout_secs: u64,

    /// Sampling temperature for extraction calls
    pub temperature: f32,

    /// Token limit for extraction calls
    pub max_tokens: u32,

    /// Confidence attached to every extracted triple
    pub default_confidence: f64,
}

/// Chunk size used by the sentence strategy when none is configured
pub const SENTENCE_CHUNK_SIZE: usize = 20_000;

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.overlap_size >= self.chunk_size {
            return Err("overlap_size must be smaller than chunk_size".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be within [0.0, 2.0]".to_string());
        }
        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err("default_confidence must be within [0.0, 1.0]".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// PyG-style 512 character chunks without overlap
    fn default() -> Self {
        Self {
            chunk_strategy: ChunkStrategy::PyG,
            chunk_size: 512,
            overlap_size: 0,
            max_text_length: 5_000_000,
            extraction_timeout_secs: 600,
            temperature: 0.1,
            max_tokens: 8192,
            default_confidence: 0.8,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: small chunks and a short timeout for fast local models
    pub fn aggressive() -> Self {
        Self {
            chunk_size: 256,
            max_text_length: 500_000,
            extraction_timeout_secs: 120,
            max_tokens: 2048,
            ..Self::default()
        }
    }

    /// Lenient preset: large sentence chunks for long-context models
    pub fn lenient() -> Self {
        Self {
            chunk_strategy: ChunkStrategy::Sentence,
            chunk_size: SENTENCE_CHUNK_SIZE,
            extraction_timeout_secs: 1_800,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
