//! Graph database backend selector

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which graph database backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphDbType {
    /// Neo4j property graph
    Neo4j,

    /// ArangoDB document-and-graph store
    #[default]
    ArangoDb,

    /// Apache Jena Fuseki RDF triple store
    Jena,
}

impl GraphDbType {
    /// All supported backends
    pub const ALL: [GraphDbType; 3] = [GraphDbType::Neo4j, GraphDbType::ArangoDb, GraphDbType::Jena];

    /// Lowercase name used in settings, query strings and env vars
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphDbType::Neo4j => "neo4j",
            GraphDbType::ArangoDb => "arangodb",
            GraphDbType::Jena => "jena",
        }
    }
}

impl fmt::Display for GraphDbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown backend name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseGraphDbTypeError(pub String);

impl fmt::Display for ParseGraphDbTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown graph database type: {}", self.0)
    }
}

impl std::error::Error for ParseGraphDbTypeError {}

impl FromStr for GraphDbType {
    type Err = ParseGraphDbTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neo4j" => Ok(GraphDbType::Neo4j),
            "arangodb" | "arango" => Ok(GraphDbType::ArangoDb),
            "jena" | "fuseki" => Ok(GraphDbType::Jena),
            other => Err(ParseGraphDbTypeError(other.to_string())),
        }
    }
}
