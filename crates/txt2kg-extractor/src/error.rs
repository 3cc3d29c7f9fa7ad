//! Error types for the Extractor

use thiserror::Error;
use txt2kg_llm::LlmError;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Nothing to extract from
    #[error("Text is required")]
    EmptyText,

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Extraction timeout
    #[error("Extraction timed out after {0}s")]
    Timeout(u64),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// True when a later attempt at the same request may succeed
    ///
    /// Input validation failures are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractorError::Llm(e) => e.is_retryable(),
            ExtractorError::Timeout(_) => true,
            ExtractorError::EmptyText
            | ExtractorError::TextTooLong(..)
            | ExtractorError::Config(_) => false,
        }
    }
}
