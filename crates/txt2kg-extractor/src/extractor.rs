//! Core Extractor implementation

use crate::chunking::TextChunker;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::merge::merge_triples;
use crate::parser::parse_llm_response;
use crate::prompt::PromptBuilder;
use crate::types::{ExtractionRequest, ExtractionResult};
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info};
use txt2kg_domain::{Triple, TripleMetadata};
use txt2kg_llm::{BatchItemResult, BatchProcessor, CompletionOptions, LlmProvider};

const SOURCE_EXCERPT_CHARS: usize = 100;
const CONTEXT_EXCERPT_CHARS: usize = 200;

/// The Extractor turns raw text into deduplicated triples
///
/// Text is chunked, every chunk is sent to the LLM concurrently, each
/// response is parsed, and the per-chunk results are merged by exact key.
pub struct Extractor {
    llm: Arc<dyn LlmProvider>,
    config: ExtractorConfig,
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

impl Extractor {
    /// Create a new Extractor
    pub fn new(llm: Arc<dyn LlmProvider>, config: ExtractorConfig) -> Self {
        Self { llm, config }
    }

    /// Provider used for extraction
    pub fn provider(&self) -> &dyn LlmProvider {
        self.llm.as_ref()
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    fn chunker_for(&self, request: &ExtractionRequest) -> TextChunker {
        let chunk_size = request
            .chunk_size
            .filter(|n| *n > 0)
            .unwrap_or(self.config.chunk_size);
        let overlap = request.overlap_size.unwrap_or(self.config.overlap_size);
        TextChunker::new(self.config.chunk_strategy, chunk_size, overlap)
    }

    /// Extract triples from text
    pub async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionResult, ExtractorError> {
        if request.text.trim().is_empty() {
            return Err(ExtractorError::EmptyText);
        }

        let text_len = request.text.chars().count();
        if text_len > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(
                text_len,
                self.config.max_text_length,
            ));
        }

        let start = Instant::now();
        let prompts = PromptBuilder::new()
            .with_system_prompt(request.system_prompt.as_deref())
            .with_extraction_prompt(request.extraction_prompt.as_deref());

        let chunks = self.chunker_for(&request).chunk(&request.text);
        info!(
            "Starting extraction: {} chars, {} chunks, provider '{}', model '{}'",
            text_len,
            chunks.len(),
            self.llm.name(),
            self.llm.model()
        );

        let work = try_join_all(
            chunks
                .iter()
                .enumerate()
                .map(|(idx, chunk)| self.extract_chunk(idx, chunks.len(), chunk, &prompts)),
        );
        let per_chunk = timeout(self.config.extraction_timeout(), work)
            .await
            .map_err(|_| ExtractorError::Timeout(self.config.extraction_timeout_secs))??;

        let triples = merge_triples(per_chunk);
        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Extraction complete: {} triples from {} chunks in {}ms",
            triples.len(),
            chunks.len(),
            processing_time_ms
        );

        Ok(ExtractionResult {
            triples,
            chunk_count: chunks.len(),
            provider: self.llm.name().to_string(),
            model: self.llm.model().to_string(),
            custom_prompt_used: prompts.is_custom(),
            processing_time_ms,
        })
    }

    /// Extract from one chunk and attach provenance
    async fn extract_chunk(
        &self,
        idx: usize,
        total: usize,
        chunk: &str,
        prompts: &PromptBuilder,
    ) -> Result<Vec<Triple>, ExtractorError> {
        debug!("Processing chunk {}/{}, size: {}", idx + 1, total, chunk.chars().count());

        let options = CompletionOptions {
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        let response = self.llm.complete(&prompts.build(chunk), &options).await?;
        debug!("LLM response length: {} chars", response.len());

        let metadata = TripleMetadata {
            entity_types: Vec::new(),
            source: Some(excerpt(chunk, SOURCE_EXCERPT_CHARS)),
            context: Some(excerpt(chunk, CONTEXT_EXCERPT_CHARS)),
            extraction_method: Some(self.llm.name().to_string()),
            model: Some(self.llm.model().to_string()),
        };

        Ok(parse_llm_response(&response)
            .into_iter()
            .map(|t| {
                t.with_confidence(self.config.default_confidence)
                    .with_metadata(metadata.clone())
            })
            .collect())
    }

    /// Extract from many texts with bounded concurrency
    ///
    /// Each request runs the full pipeline; failures are reported per item.
    /// Validation failures are not retried.
    pub async fn extract_batch(
        &self,
        requests: Vec<ExtractionRequest>,
        batch: &BatchProcessor,
    ) -> Vec<BatchItemResult<ExtractionResult>> {
        info!(
            "Starting batch extraction of {} texts (concurrency {})",
            requests.len(),
            batch.config().concurrency
        );
        batch
            .run_with_retry(
                requests,
                |request| self.extract(request.clone()),
                ExtractorError::is_retryable,
            )
            .await
    }
}
