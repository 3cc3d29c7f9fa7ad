//! Vector search configuration

use crate::embedding::{SentenceTransformerEmbedder, DEFAULT_EMBEDDER_URL};
use crate::index::{InMemoryIndex, PineconeIndex, VectorIndex};
use crate::triple_index::TripleIndex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Embedding service and vector index settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    /// Sentence-transformers service URL
    pub embedder_url: String,

    /// Batch size passed to the embedding service
    pub embed_batch_size: usize,

    /// Pinecone index host; the in-memory index is used when unset
    pub pinecone_host: Option<String>,

    /// Pinecone API key
    pub pinecone_api_key: Option<String>,

    /// Pinecone namespace
    pub pinecone_namespace: String,

    /// Results returned when a query does not ask for a count
    pub default_top_k: usize,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            embedder_url: DEFAULT_EMBEDDER_URL.to_string(),
            embed_batch_size: 32,
            pinecone_host: None,
            pinecone_api_key: None,
            pinecone_namespace: String::new(),
            default_top_k: 10,
        }
    }
}

impl VectorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.embedder_url.trim().is_empty() {
            return Err("embedder_url must not be empty".to_string());
        }
        if self.embed_batch_size == 0 {
            return Err("embed_batch_size must be at least 1".to_string());
        }
        if self.default_top_k == 0 {
            return Err("default_top_k must be at least 1".to_string());
        }
        if self.pinecone_host.is_some() && self.pinecone_api_key.is_none() {
            return Err("pinecone_api_key is required when pinecone_host is set".to_string());
        }
        Ok(())
    }

    /// Apply `SENTENCE_TRANSFORMER_URL` and `PINECONE_*` variables
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides from an arbitrary lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SENTENCE_TRANSFORMER_URL") {
            self.embedder_url = v;
        }
        if let Some(v) = lookup("PINECONE_HOST") {
            self.pinecone_host = Some(v);
        }
        if let Some(v) = lookup("PINECONE_API_KEY") {
            self.pinecone_api_key = Some(v);
        }
        if let Some(v) = lookup("PINECONE_NAMESPACE") {
            self.pinecone_namespace = v;
        }
    }

    /// True when both Pinecone host and key are set
    pub fn is_pinecone_configured(&self) -> bool {
        self.pinecone_host.as_deref().is_some_and(|h| !h.trim().is_empty())
            && self.pinecone_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Vector index selected by this configuration
    pub fn build_index(&self) -> Arc<dyn VectorIndex> {
        match (&self.pinecone_host, &self.pinecone_api_key) {
            (Some(host), Some(key)) if self.is_pinecone_configured() => {
                info!("Using Pinecone index at {}", host);
                Arc::new(
                    PineconeIndex::new(host.clone(), key.clone())
                        .with_namespace(self.pinecone_namespace.clone()),
                )
            }
            _ => {
                warn!("Pinecone not configured; using in-memory vector index");
                Arc::new(InMemoryIndex::new())
            }
        }
    }

    /// Triple index backed by the sentence-transformers service
    pub fn build_triple_index(&self) -> TripleIndex {
        let embedder = SentenceTransformerEmbedder::new(self.embedder_url.clone())
            .with_batch_size(self.embed_batch_size);
        TripleIndex::new(Arc::new(embedder), self.build_index())
    }
}
