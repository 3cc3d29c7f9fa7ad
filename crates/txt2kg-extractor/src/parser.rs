//! Parse LLM output into triples
//!
//! Two entry points:
//!
//! - [`parse_triples`] reads the tuple formats produced by the PyG-style
//!   prompt, one `(subject, predicate, object)` per line.
//! - [`parse_llm_response`] is the lenient reader used for chat providers: JSON
//!   first, then tuples, then `s - p - o` / `s | p | o` lines.
//!
//! Neither ever fails. Unparseable input yields an empty vector.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};
use txt2kg_domain::Triple;

/// A named line matcher; the first pattern that matches a line wins
pub struct LinePattern {
    name: &'static str,
    regex: Regex,
}

impl LinePattern {
    /// Pattern name, for logging
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Extract a normalised triple from one line
    pub fn extract(&self, line: &str) -> Option<Triple> {
        let caps = self.regex.captures(line)?;
        let field = |i: usize| caps.get(i).map(|m| m.as_str().trim().to_lowercase());
        let (subject, predicate, object) = (field(1)?, field(2)?, field(3)?);
        let triple = Triple::new(subject, predicate, object);
        triple.is_valid().then_some(triple)
    }
}

const LINE_PATTERN_SOURCES: [(&str, &str); 5] = [
    ("single_quoted", r#"\('([^']+)',\s*'([^']+)',\s*'([^']+)'\)"#),
    ("double_quoted", r#"\("([^"]+)",\s*"([^"]+)",\s*"([^"]+)"\)"#),
    ("quoted_bare", r#""([^"]+)",\s*"([^"]+)",\s*"([^"]+)""#),
    ("mixed_quotes", r#"\(['"]([^'"]+)['"],\s*['"]([^'"]+)['"],\s*['"]([^'"]+)['"]\)"#),
    ("plain", r#"^([^,]+),\s*([^,]+),\s*(.+)$"#),
];

static LINE_PATTERNS: LazyLock<Vec<LinePattern>> = LazyLock::new(|| {
    LINE_PATTERN_SOURCES
        .iter()
        .filter_map(|&(name, src)| match Regex::new(src) {
            Ok(regex) => Some(LinePattern { name, regex }),
            Err(e) => {
                warn!("Line pattern {} failed to compile: {}", name, e);
                None
            }
        })
        .collect()
});

static DASH_PIPE_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[\s\-*\d.]*(.+?)(?:\s+-\s+|\s*\|\s*)(.+?)(?:\s+-\s+|\s*\|\s*)(.+)$").ok()
});

static JSON_OBJECT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?s)\{[^{}]*?"subject"[^{}]*?"predicate"[^{}]*?"object"[^{}]*?\}"#).ok()
});

/// Ordered line matchers used by [`parse_triples`]
pub fn line_patterns() -> &'static [LinePattern] {
    &LINE_PATTERNS
}

/// Parse one candidate line against the ordered pattern table
pub fn parse_triple_line(line: &str) -> Option<Triple> {
    if line.trim().is_empty() || line.to_lowercase().contains("note:") {
        return None;
    }
    line_patterns().iter().find_map(|p| {
        let triple = p.extract(line)?;
        debug!(pattern = p.name(), "Matched triple line");
        Some(triple)
    })
}

/// Parse tuple-formatted triples
///
/// Multi-line input is parsed line by line. Single-line input of the form
/// `(s, p, o) (s, p, o) ...` is split on `") ("` and each piece re-wrapped
/// in parentheses before matching.
///
/// # Examples
///
/// ```
/// use txt2kg_extractor::parse_triples;
///
/// let triples = parse_triples("('Alice', 'works at', 'Acme')\n('Bob', 'knows', 'Alice')");
/// assert_eq!(triples.len(), 2);
/// assert_eq!(triples[0].subject, "alice");
/// ```
pub fn parse_triples(text: &str) -> Vec<Triple> {
    let lines: Vec<&str> = text.split('\n').collect();

    if lines.len() > 1 {
        return lines
            .iter()
            .filter_map(|line| parse_triple_line(line.trim()))
            .collect();
    }

    let trimmed = text.trim();
    if trimmed.starts_with('(') && trimmed.ends_with(')') && trimmed.len() >= 2 {
        let inner = &trimmed[1..trimmed.len() - 1];
        inner
            .split(") (")
            .filter_map(|piece| parse_triple_line(&format!("({})", piece)))
            .collect()
    } else {
        parse_triple_line(trimmed).into_iter().collect()
    }
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json) up to the first newline
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn triple_from_json(value: &Value) -> Option<Triple> {
    let obj = value.as_object()?;
    let field = |key: &str| match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    let triple = Triple::new(field("subject")?, field("predicate")?, field("object")?).normalized();
    triple.is_valid().then_some(triple)
}

fn triples_from_json_array(json: &str) -> Option<Vec<Triple>> {
    let value: Value = serde_json::from_str(json).ok()?;
    let items = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => obj.get("triples")?.as_array()?.as_slice(),
        _ => return None,
    };
    Some(items.iter().filter_map(triple_from_json).collect())
}

fn parse_json_triples(text: &str) -> Option<Vec<Triple>> {
    let body = strip_code_fences(text);

    // First `[ ... ]` span, then the whole body
    if let (Some(open), Some(close)) = (body.find('['), body.rfind(']')) {
        if open < close {
            if let Some(triples) = triples_from_json_array(&body[open..=close]) {
                return Some(triples);
            }
        }
    }
    if let Some(triples) = triples_from_json_array(body) {
        return Some(triples);
    }

    // Loose objects scattered through prose
    let objects = JSON_OBJECT.as_ref()?;
    let found: Vec<Triple> = objects
        .find_iter(body)
        .filter_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .filter_map(|v| triple_from_json(&v))
        .collect();
    (!found.is_empty()).then_some(found)
}

fn parse_dash_pipe_lines(text: &str) -> Vec<Triple> {
    let Some(regex) = DASH_PIPE_LINE.as_ref() else {
        return Vec::new();
    };
    text.lines()
        .filter_map(|line| {
            let caps = regex.captures(line.trim())?;
            let triple = Triple::new(
                caps.get(1)?.as_str(),
                caps.get(2)?.as_str(),
                caps.get(3)?.as_str(),
            )
            .normalized();
            triple.is_valid().then_some(triple)
        })
        .collect()
}

/// Lenient parser for chat-model output
///
/// Tries a JSON array (code fences stripped), then [`parse_triples`], then
/// dash/pipe separated lines. All triples come back trimmed and lowercased.
pub fn parse_llm_response(response: &str) -> Vec<Triple> {
    if let Some(triples) = parse_json_triples(response) {
        if !triples.is_empty() {
            debug!(count = triples.len(), "Parsed JSON triples");
            return triples;
        }
    }

    let triples = parse_triples(response);
    if !triples.is_empty() {
        debug!(count = triples.len(), "Parsed tuple triples");
        return triples;
    }

    let triples = parse_dash_pipe_lines(response);
    if triples.is_empty() && !response.trim().is_empty() && response.trim() != "[]" {
        warn!(
            chars = response.len(),
            "No triples could be parsed from LLM response"
        );
    }
    triples
}
