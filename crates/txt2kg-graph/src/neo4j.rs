//! Neo4j backend over the HTTP transactional Cypher endpoint

use crate::config::{ConnectionParams, Neo4jConfig};
use crate::error::GraphDbError;
use crate::http::{build_client, check_status, trim_url, with_auth};
use crate::store::{valid_triples, ConnectionSlot, DriverInfo, GraphStore};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use txt2kg_domain::{GraphData, GraphDbType, Node, Relationship, Triple};

const BOLT_PORT: &str = ":7687";
const HTTP_PORT: &str = ":7474";

/// Map a `bolt://` or `neo4j://` URI onto the HTTP API base URL
///
/// The Bolt port 7687 becomes the HTTP port 7474; `+s` schemes map to https.
/// `http(s)://` URIs are returned unchanged (minus a trailing slash).
pub fn http_base_url(uri: &str) -> String {
    let uri = trim_url(uri);
    let Some((scheme, rest)) = uri.split_once("://") else {
        return format!("http://{}", uri);
    };
    let http_scheme = match scheme {
        "bolt" | "neo4j" => "http",
        "bolt+s" | "bolt+ssc" | "neo4j+s" | "neo4j+ssc" => "https",
        _ => return uri.clone(),
    };
    let host = match rest.strip_suffix(BOLT_PORT) {
        Some(host) => format!("{}{}", host, HTTP_PORT),
        None if rest.contains(':') => rest.to_string(),
        None => format!("{}{}", rest, HTTP_PORT),
    };
    format!("{}://{}", http_scheme, host)
}

/// Relationship type from a predicate: upper-cased, non-alphanumerics as `_`
pub fn relationship_type(predicate: &str) -> String {
    let mut out = String::with_capacity(predicate.len());
    for c in predicate.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_uppercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_');
    if out.is_empty() {
        "RELATED_TO".to_string()
    } else {
        out.to_string()
    }
}

fn import_statement(rel_type: &str) -> String {
    format!(
        "UNWIND $rows AS row \
         MERGE (s:Entity {{name: row.subject}}) \
         MERGE (o:Entity {{name: row.object}}) \
         MERGE (s)-[r:`{}`]->(o) \
         SET r.predicate = row.predicate",
        rel_type
    )
}

const NODES_QUERY: &str =
    "MATCH (n:Entity) RETURN elementId(n) AS id, labels(n) AS labels, n.name AS name";
const RELATIONSHIPS_QUERY: &str = "MATCH (s:Entity)-[r]->(o:Entity) \
     RETURN elementId(r) AS id, elementId(s) AS source, elementId(o) AS target, \
     coalesce(r.predicate, type(r)) AS type";

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<CypherError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CypherError {
    code: String,
    message: String,
}

fn as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[derive(Clone)]
struct Neo4jConnection {
    client: Client,
    config: Neo4jConfig,
    base_url: String,
}

impl Neo4jConnection {
    /// Run statements in one auto-commit transaction
    async fn commit(&self, statements: Vec<Value>) -> Result<Vec<StatementResult>, GraphDbError> {
        let url = format!("{}/db/{}/tx/commit", self.base_url, self.config.database);
        debug!("Committing {} Cypher statements to {}", statements.len(), url);

        let request = with_auth(
            self.client.post(&url),
            self.config.username.as_deref(),
            self.config.password.as_deref(),
        );
        let response = request
            .json(&json!({ "statements": statements }))
            .send()
            .await?;
        let body: CommitResponse = check_status(response).await?.json().await?;

        if let Some(err) = body.errors.first() {
            return Err(GraphDbError::Backend {
                status: 200,
                message: format!("{}: {}", err.code, err.message),
            });
        }
        Ok(body.results)
    }
}

/// Neo4j graph store
pub struct Neo4jStore {
    slot: ConnectionSlot<Neo4jConnection>,
}

impl Neo4jStore {
    /// Create an uninitialized store
    pub fn new() -> Self {
        Self {
            slot: ConnectionSlot::new(GraphDbType::Neo4j),
        }
    }
}

impl Default for Neo4jStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    fn db_type(&self) -> GraphDbType {
        GraphDbType::Neo4j
    }

    async fn initialize(&self, params: ConnectionParams) -> Result<(), GraphDbError> {
        let given = params.db_type();
        let ConnectionParams::Neo4j(config) = params else {
            return Err(GraphDbError::Config(format!(
                "expected Neo4j parameters, got {}",
                given
            )));
        };

        let conn = Neo4jConnection {
            client: build_client(),
            base_url: http_base_url(&config.uri),
            config,
        };
        conn.commit(vec![json!({ "statement": "RETURN 1" })]).await?;

        info!("Neo4j initialized: {}", conn.base_url);
        self.slot.publish(conn).await;
        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        self.slot.is_set().await
    }

    async fn import_triples(&self, triples: &[Triple]) -> Result<usize, GraphDbError> {
        let conn = self.slot.get().await?;
        let valid = valid_triples(triples);
        if valid.len() < triples.len() {
            warn!("Skipping {} invalid triples", triples.len() - valid.len());
        }
        if valid.is_empty() {
            return Ok(0);
        }

        // Cypher cannot parameterise relationship types, so group by type
        let mut by_type: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for t in &valid {
            by_type
                .entry(relationship_type(&t.predicate))
                .or_default()
                .push(json!({
                    "subject": t.subject,
                    "predicate": t.predicate,
                    "object": t.object,
                }));
        }

        let statements = by_type
            .into_iter()
            .map(|(rel_type, rows)| {
                json!({
                    "statement": import_statement(&rel_type),
                    "parameters": { "rows": rows },
                })
            })
            .collect();
        conn.commit(statements).await?;

        info!("Imported {} triples into Neo4j", valid.len());
        Ok(valid.len())
    }

    async fn get_graph_data(&self) -> Result<GraphData, GraphDbError> {
        let conn = self.slot.get().await?;
        let results = conn
            .commit(vec![
                json!({ "statement": NODES_QUERY }),
                json!({ "statement": RELATIONSHIPS_QUERY }),
            ])
            .await?;

        let mut results = results.into_iter();
        let (Some(node_rows), Some(rel_rows)) = (results.next(), results.next()) else {
            return Err(GraphDbError::InvalidResponse(
                "expected two statement results".to_string(),
            ));
        };

        let nodes = node_rows
            .data
            .iter()
            .filter_map(|d| {
                let labels = d
                    .row
                    .get(1)
                    .and_then(Value::as_array)
                    .map(|ls| ls.iter().filter_map(|l| as_string(Some(l))).collect())
                    .unwrap_or_default();
                Some(Node {
                    id: as_string(d.row.first())?,
                    labels,
                    name: as_string(d.row.get(2)),
                })
            })
            .collect();

        let relationships = rel_rows
            .data
            .iter()
            .filter_map(|d| {
                Some(Relationship {
                    id: as_string(d.row.first())?,
                    source: as_string(d.row.get(1))?,
                    target: as_string(d.row.get(2))?,
                    rel_type: as_string(d.row.get(3)).unwrap_or_default(),
                })
            })
            .collect();

        Ok(GraphData {
            nodes,
            relationships,
        })
    }

    async fn clear_database(&self) -> Result<(), GraphDbError> {
        let conn = self.slot.get().await?;
        conn.commit(vec![json!({ "statement": "MATCH (n) DETACH DELETE n" })])
            .await?;
        info!("Neo4j database cleared");
        Ok(())
    }

    async fn close(&self) {
        if self.slot.clear().await {
            info!("Neo4j connection closed");
        }
    }

    async fn driver_info(&self) -> DriverInfo {
        match self.slot.peek().await {
            Some(conn) => DriverInfo {
                db_type: GraphDbType::Neo4j,
                connected: true,
                url: Some(conn.config.uri.clone()),
                database: Some(conn.config.database.clone()),
                has_auth: conn.config.username.is_some() && conn.config.password.is_some(),
            },
            None => DriverInfo::disconnected(GraphDbType::Neo4j),
        }
    }
}
