//! Request and response types for extraction

use txt2kg_domain::Triple;

/// Request to extract triples from text
#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    /// Text to extract triples from
    pub text: String,

    /// System prompt override
    pub system_prompt: Option<String>,

    /// User prompt template override (`{text}` is replaced by each chunk)
    pub extraction_prompt: Option<String>,

    /// Chunk size override
    pub chunk_size: Option<usize>,

    /// Overlap override
    pub overlap_size: Option<usize>,
}

impl ExtractionRequest {
    /// Request with default prompts and chunking
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Result of an extraction operation
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Merged triples across all chunks
    pub triples: Vec<Triple>,

    /// Number of chunks sent to the LLM
    pub chunk_count: usize,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,

    /// True when a prompt override was applied
    pub custom_prompt_used: bool,

    /// Wall-clock time of the extraction
    pub processing_time_ms: u64,
}
