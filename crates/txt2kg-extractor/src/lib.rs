//! txt2kg Extractor
//!
//! Converts unstructured text into knowledge-graph triples using an LLM.
//!
//! # Overview
//!
//! Documents are too large for a single completion, so the extractor splits
//! them into chunks, asks the LLM for triples from every chunk concurrently,
//! parses whatever format the model answered in, and merges the results.
//!
//! # Architecture
//!
//! ```text
//! Text → Chunker → LLM (per chunk) → Parser → Merge → Vec<Triple>
//! ```
//!
//! # Key Features
//!
//! - **PyG-style chunking**: fixed windows split at sentence ends, optional overlap
//! - **Sentence chunking**: large chunks for long-context models
//! - **Tolerant parsing**: JSON arrays, tuple lines, dash/pipe lines
//! - **Batch Processing**: many documents with a concurrency cap and retry
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use txt2kg_extractor::{Extractor, ExtractorConfig, ExtractionRequest};
//! use txt2kg_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = Arc::new(MockProvider::new("('alice', 'works at', 'acme')"));
//! let extractor = Extractor::new(llm, ExtractorConfig::default());
//!
//! let result = extractor
//!     .extract(ExtractionRequest::new("Alice works at Acme Corp."))
//!     .await?;
//!
//! println!("{} triples from {} chunks", result.triples.len(), result.chunk_count);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod extractor;
mod merge;
mod parser;
mod prompt;
mod types;


pub use chunking::{chunk_text, chunk_text_pyg, TextChunker};
pub use config::{ChunkStrategy, ExtractorConfig, SENTENCE_CHUNK_SIZE};
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use merge::merge_triples;
pub use parser::{line_patterns, parse_llm_response, parse_triple_line, parse_triples, LinePattern};
pub use prompt::{PromptBuilder, DEFAULT_EXTRACTION_PROMPT, DEFAULT_SYSTEM_PROMPT};
pub use types::{ExtractionRequest, ExtractionResult};
