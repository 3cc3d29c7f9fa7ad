//! Triple extraction endpoints

use super::AppState;
use crate::error::{AppError, AppJson};
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use txt2kg_domain::Triple;
use txt2kg_extractor::{ExtractionRequest, Extractor, ExtractorError};
use txt2kg_llm::{BatchConfig, BatchProcessor, LlmConfig, LlmOverrides};

/// Reported in the `method` field of extraction responses
const EXTRACTION_METHOD: &str = "standard_pipeline";

/// Provider selection shared by the single and batch requests
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFields {
    llm_provider: Option<String>,
    ollama_model: Option<String>,
    ollama_base_url: Option<String>,
    vllm_model: Option<String>,
    vllm_base_url: Option<String>,
    nvidia_model: Option<String>,
}

impl ProviderFields {
    fn llm_config(&self, base: &LlmConfig) -> Result<LlmConfig, AppError> {
        let provider = match self.llm_provider.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => Some(
                p.parse()
                    .map_err(|_| AppError::BadRequest(format!("Unsupported LLM provider: {}", p)))?,
            ),
            _ => None,
        };
        Ok(base.with_overrides(&LlmOverrides {
            provider,
            ollama_model: self.ollama_model.clone(),
            ollama_base_url: self.ollama_base_url.clone(),
            vllm_model: self.vllm_model.clone(),
            vllm_base_url: self.vllm_base_url.clone(),
            nvidia_model: self.nvidia_model.clone(),
        }))
    }
}

/// Prompt and chunking options shared by the single and batch requests
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOptions {
    system_prompt: Option<String>,
    extraction_prompt: Option<String>,
    chunk_size: Option<usize>,
    overlap_size: Option<usize>,
}

impl ExtractionOptions {
    fn request(&self, text: String) -> ExtractionRequest {
        ExtractionRequest {
            text,
            system_prompt: self.system_prompt.clone(),
            extraction_prompt: self.extraction_prompt.clone(),
            chunk_size: self.chunk_size,
            overlap_size: self.overlap_size,
        }
    }
}

/// POST /api/extract-triples body
#[derive(Debug, Deserialize)]
pub struct ExtractTriplesRequest {
    #[serde(default)]
    text: Option<Value>,
    #[serde(flatten)]
    provider: ProviderFields,
    #[serde(flatten)]
    options: ExtractionOptions,
}

/// POST /api/extract-triples response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractTriplesResponse {
    success: bool,
    triples: Vec<Triple>,
    count: usize,
    chunk_count: usize,
    method: &'static str,
    llm_provider: String,
    model: String,
    custom_prompt_used: bool,
    processing_time_ms: u64,
}

fn build_extractor(state: &AppState, provider: &ProviderFields) -> Result<Extractor, AppError> {
    let llm = provider
        .llm_config(&state.config.llm)?
        .build_provider()
        .map_err(|e| AppError::internal("Failed to extract triples", e))?;
    Ok(Extractor::new(llm, state.config.extractor.clone()))
}

fn extraction_error(err: ExtractorError) -> AppError {
    match err {
        ExtractorError::EmptyText | ExtractorError::TextTooLong(..) => {
            AppError::BadRequest(err.to_string())
        }
        other => AppError::internal("Failed to extract triples", other),
    }
}

/// POST /api/extract-triples - Extract triples from one text
pub async fn extract_triples(
    State(state): State<AppState>,
    AppJson(body): AppJson<ExtractTriplesRequest>,
) -> Result<Json<ExtractTriplesResponse>, AppError> {
    let text = match body.text {
        Some(Value::String(t)) if !t.trim().is_empty() => t,
        _ => return Err(AppError::BadRequest("Text is required".to_string())),
    };

    let extractor = build_extractor(&state, &body.provider)?;
    let result = extractor
        .extract(body.options.request(text))
        .await
        .map_err(extraction_error)?;

    Ok(Json(ExtractTriplesResponse {
        success: true,
        count: result.triples.len(),
        triples: result.triples,
        chunk_count: result.chunk_count,
        method: EXTRACTION_METHOD,
        llm_provider: result.provider,
        model: result.model,
        custom_prompt_used: result.custom_prompt_used,
        processing_time_ms: result.processing_time_ms,
    }))
}

/// POST /api/extract-triples/batch body
#[derive(Debug, Deserialize)]
pub struct BatchExtractRequest {
    #[serde(default)]
    texts: Vec<String>,
    #[serde(default)]
    concurrency: Option<usize>,
    #[serde(flatten)]
    provider: ProviderFields,
    #[serde(flatten)]
    options: ExtractionOptions,
}

/// Outcome of one text in a batch
#[derive(Debug, Serialize)]
pub struct BatchItem {
    index: usize,
    triples: Vec<Triple>,
    attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// POST /api/extract-triples/batch response
#[derive(Debug, Serialize)]
pub struct BatchExtractResponse {
    success: bool,
    results: Vec<BatchItem>,
    succeeded: usize,
    failed: usize,
}

/// POST /api/extract-triples/batch - Extract triples from many texts
///
/// Items fail independently; the response reports each outcome.
pub async fn extract_batch(
    State(state): State<AppState>,
    AppJson(body): AppJson<BatchExtractRequest>,
) -> Result<Json<BatchExtractResponse>, AppError> {
    if body.texts.is_empty() {
        return Err(AppError::BadRequest(
            "Texts are required and must be a non-empty array".to_string(),
        ));
    }

    let extractor = build_extractor(&state, &body.provider)?;
    let batch = BatchProcessor::new(BatchConfig {
        concurrency: body.concurrency.unwrap_or(state.config.batch.concurrency),
        ..state.config.batch.clone()
    });
    let requests: Vec<ExtractionRequest> = body
        .texts
        .into_iter()
        .map(|text| body.options.request(text))
        .collect();

    let results: Vec<BatchItem> = extractor
        .extract_batch(requests, &batch)
        .await
        .into_iter()
        .map(|item| match item.result {
            Ok(result) => BatchItem {
                index: item.index,
                triples: result.triples,
                attempts: item.attempts,
                error: None,
            },
            Err(error) => BatchItem {
                index: item.index,
                triples: Vec::new(),
                attempts: item.attempts,
                error: Some(error),
            },
        })
        .collect();

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    info!(
        "Batch extraction finished: {} succeeded, {} failed",
        results.len() - failed,
        failed
    );

    Ok(Json(BatchExtractResponse {
        success: true,
        succeeded: results.len() - failed,
        failed,
        results,
    }))
}
