//! Merge per-chunk extraction results

use std::collections::HashSet;
use txt2kg_domain::Triple;

/// Concatenate triple lists, keeping the first occurrence of each exact
/// `subject|predicate|object` key
///
/// Keys are compared as-is; `("A", "P", "B")` and `("a", "p", "b")` are
/// distinct. Use [`txt2kg_domain::dedup_case_insensitive`] for folded keys.
pub fn merge_triples(arrays: Vec<Vec<Triple>>) -> Vec<Triple> {
    let mut seen = HashSet::new();
    arrays
        .into_iter()
        .flatten()
        .filter(|t| seen.insert(t.key()))
        .collect()
}
