//! Vector indexes: the `VectorIndex` trait, an in-memory index and Pinecone

use crate::embedding::cosine_similarity;
use crate::error::{check_status, VectorError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Maximum vectors per Pinecone upsert request
pub const UPSERT_BATCH_SIZE: usize = 100;

/// A vector with its id and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Stable identifier
    pub id: String,
    /// Embedding
    pub values: Vec<f32>,
    /// Arbitrary metadata stored with the vector
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// A query hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    /// Record id
    pub id: String,
    /// Similarity score (higher is closer)
    pub score: f32,
    /// Stored metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Index statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Vector dimension, when known
    #[serde(default)]
    pub dimension: Option<usize>,
    /// Number of stored vectors
    #[serde(default)]
    pub total_vector_count: u64,
}

/// Nearest-neighbour store for embeddings
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace records by id, returning how many were written
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize, VectorError>;

    /// The `top_k` closest records to `vector`, best first
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>, VectorError>;

    /// Remove every record
    async fn delete_all(&self) -> Result<(), VectorError>;

    /// Index statistics
    async fn stats(&self) -> Result<IndexStats, VectorError>;
}

/// Brute-force cosine index held in memory
///
/// Used when no Pinecone index is configured, and in tests.
#[derive(Default)]
pub struct InMemoryIndex {
    records: RwLock<HashMap<String, VectorRecord>>,
    dimension: RwLock<Option<usize>>,
}

impl InMemoryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize, VectorError> {
        let mut dimension = self.dimension.write().await;
        for record in &records {
            match *dimension {
                Some(expected) if expected != record.values.len() => {
                    return Err(VectorError::DimensionMismatch {
                        expected,
                        actual: record.values.len(),
                    });
                }
                Some(_) => {}
                None => *dimension = Some(record.values.len()),
            }
        }

        let count = records.len();
        let mut stored = self.records.write().await;
        for record in records {
            stored.insert(record.id.clone(), record);
        }
        Ok(count)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>, VectorError> {
        if let Some(expected) = *self.dimension.read().await {
            if expected != vector.len() {
                return Err(VectorError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        let stored = self.records.read().await;
        let mut matches: Vec<VectorMatch> = stored
            .values()
            .map(|r| VectorMatch {
                id: r.id.clone(),
                score: cosine_similarity(vector, &r.values),
                metadata: r.metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn delete_all(&self) -> Result<(), VectorError> {
        self.records.write().await.clear();
        *self.dimension.write().await = None;
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats, VectorError> {
        Ok(IndexStats {
            dimension: *self.dimension.read().await,
            total_vector_count: self.records.read().await.len() as u64,
        })
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

/// Pinecone data-plane client for one index host
pub struct PineconeIndex {
    host: String,
    api_key: String,
    namespace: String,
    client: Client,
}

impl PineconeIndex {
    /// Create a client for the index at `host` (e.g. `https://idx-abc.svc.pinecone.io`)
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });
        let host = host.into();
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{}", host)
        };
        Self {
            host: host.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            namespace: String::new(),
            client,
        }
    }

    /// Namespace used for every request
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize, VectorError> {
        let mut upserted = 0;
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            debug!("Upserting {} vectors to Pinecone", batch.len());
            let response = self
                .post("/vectors/upsert")
                .json(&json!({ "vectors": batch, "namespace": self.namespace }))
                .send()
                .await?;
            check_status(response).await?;
            upserted += batch.len();
        }
        info!("Upserted {} vectors to Pinecone", upserted);
        Ok(upserted)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>, VectorError> {
        let response = self
            .post("/query")
            .json(&json!({
                "vector": vector,
                "topK": top_k,
                "includeMetadata": true,
                "namespace": self.namespace,
            }))
            .send()
            .await?;
        let body: QueryResponse = check_status(response).await?.json().await?;
        Ok(body.matches)
    }

    async fn delete_all(&self) -> Result<(), VectorError> {
        let response = self
            .post("/vectors/delete")
            .json(&json!({ "deleteAll": true, "namespace": self.namespace }))
            .send()
            .await?;
        check_status(response).await?;
        info!("Deleted all vectors in namespace '{}'", self.namespace);
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats, VectorError> {
        let response = self
            .post("/describe_index_stats")
            .json(&json!({}))
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}
