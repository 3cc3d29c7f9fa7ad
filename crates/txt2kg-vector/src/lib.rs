//! txt2kg Vector Search
//!
//! Embeds triples and finds the ones most similar to a text query.
//!
//! # Architecture
//!
//! - [`Embedder`]: texts to vectors (sentence-transformers service, or a
//!   hash-based mock)
//! - [`VectorIndex`]: nearest-neighbour store (Pinecone, or in memory)
//! - [`TripleIndex`]: ties the two together; vector ids are derived from
//!   triple keys so re-indexing replaces instead of duplicating

#![warn(missing_docs)]

mod config;
mod embedding;
mod error;
mod index;
mod triple_index;

pub use config::VectorConfig;
pub use embedding::{
    cosine_similarity, Embedder, MockEmbedder, SentenceTransformerEmbedder, DEFAULT_EMBEDDER_URL,
};
pub use error::VectorError;
pub use index::{
    InMemoryIndex, IndexStats, PineconeIndex, VectorIndex, VectorMatch, VectorRecord,
    UPSERT_BATCH_SIZE,
};
pub use triple_index::{triple_id, triple_text, ScoredTriple, TripleIndex};
