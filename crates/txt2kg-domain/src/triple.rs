//! Triple module - the fundamental unit of an extracted knowledge graph

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Provenance attached to a triple by the extraction pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripleMetadata {
    /// Entity types detected for subject/object (may be empty)
    #[serde(default)]
    pub entity_types: Vec<String>,

    /// Leading excerpt of the source text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Wider excerpt of the source text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Name of the extraction method (provider or pipeline)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<String>,

    /// Model that produced the triple
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// A subject-predicate-object fact
///
/// A triple is *valid* when none of its three fields is empty after trimming.
/// Invalid triples can still be deserialized (requests carry arbitrary input),
/// so validity is checked with [`Triple::is_valid`] at the boundaries that care.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Triple {
    /// Subject entity
    pub subject: String,

    /// Predicate/relationship
    pub predicate: String,

    /// Object entity
    pub object: String,

    /// Extraction confidence in [0.0, 1.0]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Extraction provenance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TripleMetadata>,
}

impl Triple {
    /// Create a triple without confidence or metadata
    ///
    /// # Examples
    ///
    /// ```
    /// use txt2kg_domain::Triple;
    ///
    /// let t = Triple::new("alice", "works at", "acme");
    /// assert!(t.is_valid());
    /// assert_eq!(t.key(), "alice|works at|acme");
    /// ```
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            confidence: None,
            metadata: None,
        }
    }

    /// Attach a confidence score
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Attach extraction metadata
    pub fn with_metadata(mut self, metadata: TripleMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// True when subject, predicate and object are all non-empty after trim
    pub fn is_valid(&self) -> bool {
        !self.subject.trim().is_empty()
            && !self.predicate.trim().is_empty()
            && !self.object.trim().is_empty()
    }

    /// Trim and lowercase the three fields, keeping confidence and metadata
    pub fn normalized(self) -> Self {
        Self {
            subject: self.subject.trim().to_lowercase(),
            predicate: self.predicate.trim().to_lowercase(),
            object: self.object.trim().to_lowercase(),
            ..self
        }
    }

    /// Exact composite key `subject|predicate|object`
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.subject, self.predicate, self.object)
    }

    /// Case-insensitive composite key
    pub fn folded_key(&self) -> String {
        self.key().to_lowercase()
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.predicate, self.object)
    }
}

/// Drop triples whose case-insensitive key was already seen
///
/// Order of first occurrence is preserved.
pub fn dedup_case_insensitive(triples: Vec<Triple>) -> Vec<Triple> {
    let mut seen = HashSet::new();
    triples
        .into_iter()
        .filter(|t| seen.insert(t.folded_key()))
        .collect()
}
