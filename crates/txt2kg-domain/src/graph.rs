//! Graph export format shared by all backends

use crate::triple::{dedup_case_insensitive, Triple};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A node as returned by a graph backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Backend-specific identifier
    pub id: String,

    /// Node labels (e.g. `["Entity"]`)
    #[serde(default)]
    pub labels: Vec<String>,

    /// Human-readable entity name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Node {
    /// Create an `Entity` node
    pub fn entity(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            labels: vec!["Entity".to_string()],
            name: Some(name.into()),
        }
    }
}

/// A directed, typed relationship between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Backend-specific identifier
    pub id: String,

    /// Id of the source node
    pub source: String,

    /// Id of the target node
    pub target: String,

    /// Relationship type (the predicate)
    #[serde(rename = "type")]
    pub rel_type: String,
}

/// Nodes and relationships exported from a graph backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    /// All nodes
    pub nodes: Vec<Node>,

    /// All relationships
    pub relationships: Vec<Relationship>,
}

impl GraphData {
    /// True when the graph has neither nodes nor relationships
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }

    /// Reconstitute triples by joining relationships against node names
    ///
    /// Relationships whose endpoints are unknown or unnamed, or whose type is
    /// empty, contribute nothing. The result is deduplicated case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use txt2kg_domain::{GraphData, Node, Relationship};
    ///
    /// let graph = GraphData {
    ///     nodes: vec![Node::entity("n1", "alice"), Node::entity("n2", "acme")],
    ///     relationships: vec![Relationship {
    ///         id: "r1".into(),
    ///         source: "n1".into(),
    ///         target: "n2".into(),
    ///         rel_type: "works at".into(),
    ///     }],
    /// };
    /// let triples = graph.to_triples();
    /// assert_eq!(triples.len(), 1);
    /// assert_eq!(triples[0].predicate, "works at");
    /// ```
    pub fn to_triples(&self) -> Vec<Triple> {
        let names: HashMap<&str, &str> = self
            .nodes
            .iter()
            .filter_map(|n| n.name.as_deref().map(|name| (n.id.as_str(), name)))
            .collect();

        let triples = self
            .relationships
            .iter()
            .filter_map(|rel| {
                let subject = names.get(rel.source.as_str())?;
                let object = names.get(rel.target.as_str())?;
                if subject.is_empty() || object.is_empty() || rel.rel_type.is_empty() {
                    return None;
                }
                Some(Triple::new(*subject, rel.rel_type.as_str(), *object))
            })
            .collect();

        dedup_case_insensitive(triples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(id: &str, source: &str, target: &str, ty: &str) -> Relationship {
        Relationship {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            rel_type: ty.to_string(),
        }
    }

    #[test]
    fn test_to_triples_skips_dangling_relationships() {
        let graph = GraphData {
            nodes: vec![Node::entity("1", "alice"), Node::entity("2", "bob")],
            relationships: vec![rel("r1", "1", "2", "knows"), rel("r2", "1", "99", "knows")],
        };
        let triples = graph.to_triples();
        assert_eq!(triples, vec![Triple::new("alice", "knows", "bob")]);
    }

    #[test]
    fn test_to_triples_skips_unnamed_nodes_and_empty_types() {
        let graph = GraphData {
            nodes: vec![
                Node::entity("1", "alice"),
                Node {
                    id: "2".to_string(),
                    labels: vec![],
                    name: None,
                },
                Node::entity("3", "carol"),
            ],
            relationships: vec![rel("r1", "1", "2", "knows"), rel("r2", "1", "3", "")],
        };
        assert!(graph.to_triples().is_empty());
    }

    #[test]
    fn test_to_triples_dedups_case_insensitively() {
        let graph = GraphData {
            nodes: vec![
                Node::entity("1", "Alice"),
                Node::entity("2", "Bob"),
                Node::entity("3", "alice"),
                Node::entity("4", "bob"),
            ],
            relationships: vec![rel("r1", "1", "2", "KNOWS"), rel("r2", "3", "4", "knows")],
        };
        let triples = graph.to_triples();
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].subject, "Alice");
    }

    #[test]
    fn test_relationship_serializes_type_field() {
        let json = serde_json::to_value(rel("r", "a", "b", "likes")).unwrap();
        assert_eq!(json["type"], "likes");
        assert!(json.get("rel_type").is_none());
    }
}
