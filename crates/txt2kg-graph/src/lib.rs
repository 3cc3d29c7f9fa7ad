//! txt2kg Graph Storage Layer
//!
//! Stores extracted triples in one of three graph databases and reads them
//! back as nodes and relationships.
//!
//! # Architecture
//!
//! - [`GraphStore`]: async trait implemented by every backend
//! - [`Neo4jStore`]: property graph over the HTTP transactional Cypher API
//! - [`ArangoStore`]: `entities` documents and `relationships` edges via AQL
//! - [`JenaStore`]: RDF triples in Fuseki via SPARQL 1.1
//! - [`GraphStoreRegistry`]: one shared instance per backend type
//!
//! Stores start uninitialized and refuse data operations until
//! `initialize` succeeds.
//!
//! # Examples
//!
//! ```no_run
//! use txt2kg_graph::{ConnectionOverrides, GraphDbConfig, GraphStoreRegistry};
//! use txt2kg_domain::{GraphDbType, Triple};
//!
//! # async fn run() -> Result<(), txt2kg_graph::GraphDbError> {
//! let registry = GraphStoreRegistry::new(GraphDbConfig::default());
//! let store = registry
//!     .connect(GraphDbType::Jena, &ConnectionOverrides::default())
//!     .await?;
//! let count = store
//!     .import_triples(&[Triple::new("alice", "works at", "acme")])
//!     .await?;
//! assert_eq!(count, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod arangodb;
pub mod config;
mod error;
mod http;
pub mod jena;
pub mod neo4j;
mod registry;
mod store;

pub use arangodb::ArangoStore;
pub use config::{
    ArangoConfig, ConnectionOverrides, ConnectionParams, GraphDbConfig, JenaConfig, Neo4jConfig,
};
pub use error::GraphDbError;
pub use jena::JenaStore;
pub use neo4j::Neo4jStore;
pub use registry::GraphStoreRegistry;
pub use store::{DriverInfo, GraphStore};
