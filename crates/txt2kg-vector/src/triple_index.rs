//! Semantic search over triples

use crate::embedding::Embedder;
use crate::error::VectorError;
use crate::index::{VectorIndex, VectorRecord};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};
use txt2kg_domain::Triple;
use uuid::Uuid;

/// A triple returned by a similarity search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTriple {
    /// The triple
    #[serde(flatten)]
    pub triple: Triple,
    /// Similarity to the query
    pub score: f32,
}

/// Deterministic vector id for a triple: UUID v5 of its key
pub fn triple_id(triple: &Triple) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, triple.key().as_bytes()).to_string()
}

/// Text embedded for a triple
pub fn triple_text(triple: &Triple) -> String {
    format!("{} {} {}", triple.subject, triple.predicate, triple.object)
}

fn triple_metadata(triple: &Triple) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("subject".to_string(), Value::from(triple.subject.as_str()));
    metadata.insert("predicate".to_string(), Value::from(triple.predicate.as_str()));
    metadata.insert("object".to_string(), Value::from(triple.object.as_str()));
    metadata
}

fn triple_from_metadata(metadata: &Map<String, Value>) -> Option<Triple> {
    let field = |name: &str| metadata.get(name).and_then(Value::as_str);
    let triple = Triple::new(field("subject")?, field("predicate")?, field("object")?);
    triple.is_valid().then_some(triple)
}

/// Embeds triples into a vector index and searches them by text
#[derive(Clone)]
pub struct TripleIndex {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl TripleIndex {
    /// Combine an embedder and an index
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Underlying vector index
    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }

    /// Embed and store valid triples; re-indexing a triple replaces it
    pub async fn index_triples(&self, triples: &[Triple]) -> Result<usize, VectorError> {
        let valid: Vec<&Triple> = triples.iter().filter(|t| t.is_valid()).collect();
        if valid.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = valid.iter().map(|t| triple_text(t)).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        debug!(
            "Embedded {} triples with {}",
            embeddings.len(),
            self.embedder.name()
        );

        let records = valid
            .iter()
            .zip(embeddings)
            .map(|(t, values)| VectorRecord {
                id: triple_id(t),
                values,
                metadata: triple_metadata(t),
            })
            .collect();
        let count = self.index.upsert(records).await?;
        info!("Indexed {} triples", count);
        Ok(count)
    }

    /// The `top_k` triples closest to `query`, best first
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredTriple>, VectorError> {
        if query.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let mut embeddings = self.embedder.embed(&[query.to_string()]).await?;
        let Some(vector) = embeddings.pop() else {
            return Err(VectorError::Embedding("no embedding for query".to_string()));
        };

        let matches = self.index.query(&vector, top_k).await?;
        Ok(matches
            .into_iter()
            .filter_map(|m| {
                Some(ScoredTriple {
                    triple: triple_from_metadata(&m.metadata)?,
                    score: m.score,
                })
            })
            .collect())
    }

    /// Remove every indexed triple
    pub async fn clear(&self) -> Result<(), VectorError> {
        self.index.delete_all().await
    }
}
