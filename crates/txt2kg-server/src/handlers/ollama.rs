//! Ollama connection test and single-shot extraction

use super::AppState;
use crate::error::{AppError, AppJson};
use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use txt2kg_domain::{Triple, TripleMetadata};
use txt2kg_extractor::{parse_llm_response, PromptBuilder};
use txt2kg_llm::{CompletionOptions, LlmOverrides, LlmProvider};

const EXTRACTION_METHOD: &str = "ollama";
const SOURCE_EXCERPT_CHARS: usize = 100;
const CONTEXT_EXCERPT_CHARS: usize = 200;

/// GET /api/ollama query
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OllamaQuery {
    /// Server to test instead of the configured one
    base_url: Option<String>,
}

/// Result of the connection test
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OllamaStatus {
    success: bool,
    connected: bool,
    models: Vec<String>,
    base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// GET /api/ollama - Test the Ollama connection and list models
///
/// An unreachable server is reported in the body, not as an HTTP error.
pub async fn test_connection(
    State(state): State<AppState>,
    Query(query): Query<OllamaQuery>,
) -> Json<OllamaStatus> {
    let config = state.config.llm.with_overrides(&LlmOverrides {
        ollama_base_url: query.base_url,
        ..Default::default()
    });
    let provider = config.ollama_provider();

    match provider.list_models().await {
        Ok(models) => {
            info!("Ollama at {} reports {} models", provider.endpoint(), models.len());
            Json(OllamaStatus {
                success: true,
                connected: true,
                models,
                base_url: provider.endpoint().to_string(),
                error: None,
            })
        }
        Err(e) => {
            warn!("Ollama connection test failed: {}", e);
            Json(OllamaStatus {
                success: false,
                connected: false,
                models: Vec::new(),
                base_url: provider.endpoint().to_string(),
                error: Some(e.to_string()),
            })
        }
    }
}

/// POST /api/ollama body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OllamaExtractRequest {
    #[serde(default)]
    text: Option<Value>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

/// POST /api/ollama response
#[derive(Debug, Serialize)]
pub struct OllamaExtractResponse {
    success: bool,
    triples: Vec<Triple>,
    count: usize,
    method: &'static str,
    model: String,
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// POST /api/ollama - Extract triples with one Ollama completion
///
/// The whole text goes out in a single request; nothing is chunked or merged.
pub async fn extract_triples(
    State(state): State<AppState>,
    AppJson(body): AppJson<OllamaExtractRequest>,
) -> Result<Json<OllamaExtractResponse>, AppError> {
    let text = match body.text {
        Some(Value::String(t)) if !t.trim().is_empty() => t,
        _ => return Err(AppError::BadRequest("Text is required".to_string())),
    };

    let provider = state
        .config
        .llm
        .with_overrides(&LlmOverrides {
            ollama_model: body.model,
            ..Default::default()
        })
        .ollama_provider();
    let defaults = &state.config.extractor;
    let options = CompletionOptions {
        temperature: body.temperature.unwrap_or(defaults.temperature),
        max_tokens: body.max_tokens.unwrap_or(defaults.max_tokens),
    };

    let response = provider
        .complete(&PromptBuilder::new().build(&text), &options)
        .await
        .map_err(|e| AppError::internal("Failed to extract triples with Ollama", e))?;

    let metadata = TripleMetadata {
        entity_types: Vec::new(),
        source: Some(excerpt(&text, SOURCE_EXCERPT_CHARS)),
        context: Some(excerpt(&text, CONTEXT_EXCERPT_CHARS)),
        extraction_method: Some(EXTRACTION_METHOD.to_string()),
        model: Some(provider.model().to_string()),
    };
    let triples: Vec<Triple> = parse_llm_response(&response)
        .into_iter()
        .map(|t| {
            t.with_confidence(defaults.default_confidence)
                .with_metadata(metadata.clone())
        })
        .collect();

    info!(
        "Ollama extraction with '{}' produced {} triples",
        provider.model(),
        triples.len()
    );
    Ok(Json(OllamaExtractResponse {
        success: true,
        count: triples.len(),
        triples,
        method: EXTRACTION_METHOD,
        model: provider.model().to_string(),
    }))
}
