//! Query performance log stored as JSON lines

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default number of entries returned by `recent`
pub const DEFAULT_LIMIT: usize = 25;

/// How a query was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryMode {
    /// Graph traversal
    Traditional,
    /// Vector similarity over triples
    VectorSearch,
    /// Retrieval-augmented generation without the graph
    PureRag,
}

/// Measurements recorded for a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetrics {
    /// Wall-clock time
    #[serde(default)]
    pub execution_time_ms: f64,
    /// Relevance score, if measured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    /// Precision, if measured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,
    /// Recall, if measured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recall: Option<f64>,
    /// Number of results returned
    #[serde(default)]
    pub result_count: u64,
}

/// One logged query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLogEntry {
    /// Entry id (UUID v7)
    pub id: String,
    /// Query text
    pub query: String,
    /// Mode used
    pub query_mode: QueryMode,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Measurements
    pub metrics: QueryMetrics,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Appends entries to a JSONL file and reads the newest back
pub struct QueryLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl QueryLogger {
    /// Logger writing to `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Log file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, stamping it with an id and the current time
    pub async fn log(
        &self,
        query: &str,
        query_mode: QueryMode,
        metrics: QueryMetrics,
    ) -> std::io::Result<QueryLogEntry> {
        let entry = QueryLogEntry {
            id: Uuid::now_v7().to_string(),
            query: query.to_string(),
            query_mode,
            timestamp: now_ms(),
            metrics,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!("Logged query \"{}\" ({:?})", entry.query, entry.query_mode);
        Ok(entry)
    }

    /// Up to `limit` entries, newest first
    ///
    /// A missing file reads as empty; malformed lines are skipped.
    pub async fn recent(&self, limit: usize) -> std::io::Result<Vec<QueryLogEntry>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries: Vec<QueryLogEntry> = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping malformed query log line: {}", e);
                    None
                }
            })
            .collect();

        // file order is append order; the stable sort keeps it for equal timestamps
        entries.reverse();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }
}
