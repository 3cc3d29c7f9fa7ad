//! Text embedding
//!
//! - [`SentenceTransformerEmbedder`]: HTTP client for the sentence-transformers
//!   service (`POST /embed {texts, batch_size}` → `{embeddings}`)
//! - [`MockEmbedder`]: hash-based deterministic embeddings for tests
//!
//! # Examples
//!
//! ```
//! use txt2kg_vector::{Embedder, MockEmbedder};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let embedder = MockEmbedder::new(384);
//! let texts = vec!["The sky is blue".to_string()];
//! let first = embedder.embed(&texts).await.unwrap();
//! let second = embedder.embed(&texts).await.unwrap();
//! assert_eq!(first, second);
//! assert_eq!(first[0].len(), 384);
//! # });
//! ```

use crate::error::{check_status, VectorError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tracing::{debug, warn};

/// Default sentence-transformers service URL
pub const DEFAULT_EMBEDDER_URL: &str = "http://localhost:8000";

/// Turns texts into vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed every text, returning one vector per input in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
    batch_size: usize,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Client for the sentence-transformers embedding service
pub struct SentenceTransformerEmbedder {
    base_url: String,
    batch_size: usize,
    client: Client,
}

impl SentenceTransformerEmbedder {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            batch_size: 32,
            client,
        }
    }

    /// Batch size passed to the service
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

#[async_trait]
impl Embedder for SentenceTransformerEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Embedding {} texts via {}", texts.len(), self.base_url);

        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&EmbedRequest {
                texts,
                batch_size: self.batch_size,
            })
            .send()
            .await?;
        let body: EmbedResponse = check_status(response).await?.json().await?;

        if body.embeddings.len() != texts.len() {
            return Err(VectorError::Embedding(format!(
                "service returned {} embeddings for {} texts",
                body.embeddings.len(),
                texts.len()
            )));
        }
        Ok(body.embeddings)
    }

    fn name(&self) -> &str {
        "sentence-transformers"
    }
}

/// Hash-based embedder
///
/// Deterministic, unit-length, and different for different texts. Semantic
/// similarity is not modelled: only identical texts score 1.0.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    /// Create a mock embedder producing vectors of `dimension`
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn hash_with_seed(text: &str, seed: u64) -> f32 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        seed.hash(&mut hasher);
        let normalized = (hasher.finish() as f64 / u64::MAX as f64) * 2.0 - 1.0;
        normalized as f32
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut embedding: Vec<f32> = (0..self.dimension)
            .map(|i| Self::hash_with_seed(text, i as u64))
            .collect();
        let magnitude = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }
        embedding
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, VectorError> {
        if let Some(idx) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(VectorError::Embedding(format!("text {} is empty", idx)));
        }
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Cosine similarity in [-1, 1]; 0.0 for mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_mock_embedding_is_normalized() {
        let embedder = MockEmbedder::new(64);
        let vectors = embedder
            .embed(&["alice works at acme".to_string()])
            .await
            .unwrap();
        let magnitude: f32 = vectors[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_mock_embedding_distinguishes_texts() {
        let embedder = MockEmbedder::new(64);
        let vectors = embedder
            .embed(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_ne!(vectors[0], vectors[1]);
        assert!(cosine_similarity(&vectors[0], &vectors[1]) < 0.99);
    }

    #[tokio::test]
    async fn test_mock_rejects_empty_text() {
        let embedder = MockEmbedder::new(8);
        let result = embedder.embed(&["ok".to_string(), " ".to_string()]).await;
        assert!(matches!(result, Err(VectorError::Embedding(_))));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_sentence_transformer_embed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(body_partial_json(serde_json::json!({"texts": ["a", "b"], "batch_size": 32})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.1, 0.2], [0.3, 0.4]],
                "model": "all-MiniLM-L6-v2"
            })))
            .mount(&server)
            .await;

        let embedder = SentenceTransformerEmbedder::new(format!("{}/", server.uri()));
        let vectors = embedder
            .embed(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[tokio::test]
    async fn test_sentence_transformer_count_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"embeddings": [[0.1]]})),
            )
            .mount(&server)
            .await;

        let embedder = SentenceTransformerEmbedder::new(server.uri());
        let result = embedder.embed(&["a".to_string(), "b".to_string()]).await;
        assert!(matches!(result, Err(VectorError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_sentence_transformer_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let embedder = SentenceTransformerEmbedder::new(server.uri());
        let result = embedder.embed(&["a".to_string()]).await;
        assert!(matches!(result, Err(VectorError::Backend { status: 500, .. })));
    }
}
