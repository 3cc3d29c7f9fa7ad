//! txt2kg Domain Layer
//!
//! Core value types shared by every other crate in the workspace. This crate
//! holds no I/O and depends only on `serde`, so that the extraction pipeline,
//! the graph backends and the HTTP surface all agree on one shape for a fact.
//!
//! ## Key Concepts
//!
//! - **Triple**: a subject-predicate-object fact extracted from text
//! - **GraphData**: the canonical export format of every graph backend
//! - **GraphDbType**: which backend (property graph, document graph, RDF) to talk to
//!
//! ## Lifecycle
//!
//! Triples are created transiently during extraction, deduplicated once, then
//! persisted. They are never mutated after creation except for normalization
//! (trim + lowercase).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod db_type;
pub mod graph;
pub mod triple;

// Re-exports for convenience
pub use db_type::{GraphDbType, ParseGraphDbTypeError};
pub use graph::{GraphData, Node, Relationship};
pub use triple::{dedup_case_insensitive, Triple, TripleMetadata};
