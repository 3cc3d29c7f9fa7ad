//! Output formatting for the CLI.

use crate::client::{GraphView, SearchHit};
use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use serde::Serialize;
use serde_json::{Map, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};
use txt2kg_domain::Triple;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format triples.
    pub fn format_triples(&self, triples: &[Triple]) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_json(&triples),
            OutputFormat::Quiet => Ok(triples
                .iter()
                .map(|t| format!("{}\t{}\t{}", t.subject, t.predicate, t.object))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if triples.is_empty() {
                    return Ok(self.colorize("No triples found.", "yellow"));
                }
                let rows = triples
                    .iter()
                    .map(|t| vec![t.subject.clone(), t.predicate.clone(), t.object.clone()]);
                Ok(table(&["Subject", "Predicate", "Object"], rows))
            }
        }
    }

    /// Format search hits, best first.
    pub fn format_hits(&self, hits: &[SearchHit]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<Value> = hits
                    .iter()
                    .map(|h| {
                        serde_json::json!({
                            "subject": h.subject,
                            "predicate": h.predicate,
                            "object": h.object,
                            "score": h.score,
                        })
                    })
                    .collect();
                self.format_json(&values)
            }
            OutputFormat::Quiet => Ok(hits
                .iter()
                .map(|h| format!("{}\t{}\t{}", h.subject, h.predicate, h.object))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if hits.is_empty() {
                    return Ok(self.colorize("No matching triples.", "yellow"));
                }
                let rows = hits.iter().map(|h| {
                    vec![
                        format!("{:.3}", h.score),
                        h.subject.clone(),
                        h.predicate.clone(),
                        h.object.clone(),
                    ]
                });
                Ok(table(&["Score", "Subject", "Predicate", "Object"], rows))
            }
        }
    }

    /// Format the graph view as its edge list.
    pub fn format_graph(&self, graph: &GraphView) -> Result<String> {
        let name = |id: &str| {
            graph
                .nodes
                .iter()
                .find(|n| n.id == id)
                .map(|n| n.name.clone())
                .unwrap_or_else(|| id.to_string())
        };

        match self.format {
            OutputFormat::Json => {
                let links: Vec<Value> = graph
                    .links
                    .iter()
                    .map(|l| {
                        serde_json::json!({
                            "source": name(&l.source),
                            "label": l.label,
                            "target": name(&l.target),
                        })
                    })
                    .collect();
                self.format_json(&serde_json::json!({
                    "databaseType": graph.database_type,
                    "connectionUrl": graph.connection_url,
                    "nodeCount": graph.nodes.len(),
                    "links": links,
                }))
            }
            OutputFormat::Quiet => Ok(graph
                .links
                .iter()
                .map(|l| format!("{}\t{}\t{}", name(&l.source), l.label, name(&l.target)))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let header = self.info(&format!(
                    "{} at {}: {} nodes, {} relationships",
                    graph.database_type,
                    graph.connection_url,
                    graph.nodes.len(),
                    graph.links.len()
                ));
                if graph.links.is_empty() {
                    return Ok(header);
                }
                let rows = graph
                    .links
                    .iter()
                    .map(|l| vec![name(&l.source), l.label.clone(), name(&l.target)]);
                Ok(format!(
                    "{}\n{}",
                    header,
                    table(&["Source", "Relationship", "Target"], rows)
                ))
            }
        }
    }

    /// Format a settings map.
    pub fn format_settings(&self, settings: &Map<String, Value>) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_json(settings),
            OutputFormat::Quiet => Ok(settings
                .iter()
                .map(|(k, v)| format!("{}={}", k, display_value(v)))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if settings.is_empty() {
                    return Ok(self.colorize("No settings stored.", "yellow"));
                }
                let rows = settings
                    .iter()
                    .map(|(k, v)| vec![k.clone(), display_value(v)]);
                Ok(table(&["Key", "Value"], rows))
            }
        }
    }

    /// Pretty-printed JSON.
    pub fn format_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn table(header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(header.iter().copied());
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

/// Strings unquoted, everything else as compact JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
