//! Apache Jena Fuseki backend (SPARQL 1.1 over HTTP)

use crate::config::{ConnectionParams, JenaConfig};
use crate::error::GraphDbError;
use crate::http::{build_client, check_status, trim_url, with_auth};
use crate::store::{valid_triples, ConnectionSlot, DriverInfo, GraphStore};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use txt2kg_domain::{GraphData, GraphDbType, Node, Relationship, Triple};

/// Maximum triples per `INSERT DATA` request
pub const INSERT_BATCH_SIZE: usize = 100;

const PREFIXES: &str = "PREFIX ex: <http://example.org/>
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX txt2kg: <http://txt2kg.example.org/>
";

const ENTITIES_QUERY: &str = "SELECT DISTINCT ?entity ?label WHERE {
  ?entity rdf:type txt2kg:Entity .
  ?entity rdfs:label ?label .
}";

const RELATIONSHIPS_QUERY: &str = "SELECT DISTINCT ?subject ?predicate ?object WHERE {
  ?subject ?predicate ?object .
  ?subject rdf:type txt2kg:Entity .
  ?object rdf:type txt2kg:Entity .
  FILTER(?predicate != rdf:type && ?predicate != rdfs:label)
}";

/// Escape a value for use inside a SPARQL string literal
pub fn escape_literal(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Replace everything outside `[A-Za-z0-9_-]` with `_` and collapse runs of `_`
pub fn sanitize_local_name(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

fn entity_uri(name: &str) -> String {
    format!("ex:entity_{}", sanitize_local_name(name))
}

fn predicate_uri(predicate: &str) -> String {
    format!("ex:{}", sanitize_local_name(predicate))
}

/// Relationship type from a predicate URI: local name with `_` read as space
fn predicate_type(uri: &str) -> String {
    let local = match uri.rsplit_once('#') {
        Some((_, name)) => name,
        None => uri.rsplit('/').next().unwrap_or(uri),
    };
    let local = local.strip_prefix("ex:").unwrap_or(local);
    if local.is_empty() {
        "RELATED_TO".to_string()
    } else {
        local.replace('_', " ")
    }
}

/// One `INSERT DATA` update for a batch of valid triples
pub fn build_insert(batch: &[Triple]) -> String {
    let mut update = format!("{}\nINSERT DATA {{\n", PREFIXES);
    for triple in batch {
        let subject = entity_uri(&triple.subject);
        let object = entity_uri(&triple.object);
        let predicate = predicate_uri(&triple.predicate);
        update.push_str(&format!("  {} rdf:type txt2kg:Entity .\n", subject));
        update.push_str(&format!("  {} rdf:type txt2kg:Entity .\n", object));
        update.push_str(&format!(
            "  {} rdfs:label \"{}\" .\n",
            subject,
            escape_literal(&triple.subject)
        ));
        update.push_str(&format!(
            "  {} rdfs:label \"{}\" .\n",
            object,
            escape_literal(&triple.object)
        ));
        update.push_str(&format!("  {} {} {} .\n\n", subject, predicate, object));
    }
    update.push('}');
    update
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: SparqlBindings,
}

#[derive(Debug, Deserialize)]
struct SparqlBindings {
    bindings: Vec<HashMap<String, SparqlValue>>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

fn binding<'a>(row: &'a HashMap<String, SparqlValue>, name: &str) -> Option<&'a str> {
    row.get(name).map(|v| v.value.as_str())
}

#[derive(Clone)]
struct JenaConnection {
    client: Client,
    config: JenaConfig,
}

impl JenaConnection {
    fn dataset_url(&self, service: &str) -> String {
        format!(
            "{}/{}/{}",
            trim_url(&self.config.endpoint),
            self.config.dataset,
            service
        )
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        with_auth(
            request,
            self.config.username.as_deref(),
            self.config.password.as_deref(),
        )
    }

    async fn send_query(&self, sparql: &str) -> Result<reqwest::Response, GraphDbError> {
        let url = self.dataset_url("sparql");
        debug!("Executing SPARQL query on {}", url);
        let response = self
            .authed(self.client.post(&url))
            .header("Content-Type", "application/sparql-query")
            .header("Accept", "application/sparql-results+json")
            .body(format!("{}{}", PREFIXES, sparql))
            .send()
            .await?;
        check_status(response).await
    }

    async fn query(&self, sparql: &str) -> Result<SparqlResults, GraphDbError> {
        Ok(self.send_query(sparql).await?.json().await?)
    }

    async fn update(&self, sparql: String) -> Result<(), GraphDbError> {
        let response = self
            .authed(self.client.post(self.dataset_url("update")))
            .header("Content-Type", "application/sparql-update")
            .body(sparql)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Jena Fuseki graph store
pub struct JenaStore {
    slot: ConnectionSlot<JenaConnection>,
}

impl JenaStore {
    /// Create an uninitialized store
    pub fn new() -> Self {
        Self {
            slot: ConnectionSlot::new(GraphDbType::Jena),
        }
    }
}

impl Default for JenaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for JenaStore {
    fn db_type(&self) -> GraphDbType {
        GraphDbType::Jena
    }

    async fn initialize(&self, params: ConnectionParams) -> Result<(), GraphDbError> {
        let given = params.db_type();
        let ConnectionParams::Jena(config) = params else {
            return Err(GraphDbError::Config(format!(
                "expected Jena parameters, got {}",
                given
            )));
        };

        let conn = JenaConnection {
            client: build_client(),
            config,
        };
        conn.send_query("ASK { ?s ?p ?o }").await?;

        info!(
            "Jena Fuseki initialized: {}/{}",
            trim_url(&conn.config.endpoint),
            conn.config.dataset
        );
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

        let mut imported = 0;
        for (idx, batch) in valid.chunks(INSERT_BATCH_SIZE).enumerate() {
            if let Err(e) = conn.update(build_insert(batch)).await {
                warn!("Failed to import batch {}: {}", idx + 1, e);
                return Err(e);
            }
            imported += batch.len();
        }

        info!("Imported {} triples into Jena Fuseki", imported);
        Ok(imported)
    }

    async fn get_graph_data(&self) -> Result<GraphData, GraphDbError> {
        let conn = self.slot.get().await?;

        let entities = conn.query(ENTITIES_QUERY).await?;
        let mut uri_to_id = HashMap::new();
        let mut nodes = Vec::new();
        for row in &entities.results.bindings {
            let (Some(uri), Some(label)) = (binding(row, "entity"), binding(row, "label")) else {
                continue;
            };
            if uri_to_id.contains_key(uri) {
                continue;
            }
            let id = format!("node_{}", nodes.len());
            uri_to_id.insert(uri.to_string(), id.clone());
            nodes.push(Node::entity(id, label));
        }

        let statements = conn.query(RELATIONSHIPS_QUERY).await?;
        let relationships = statements
            .results
            .bindings
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                let source = uri_to_id.get(binding(row, "subject")?)?;
                let target = uri_to_id.get(binding(row, "object")?)?;
                Some(Relationship {
                    id: format!("rel_{}", idx),
                    source: source.clone(),
                    target: target.clone(),
                    rel_type: predicate_type(binding(row, "predicate")?),
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
        conn.update("CLEAR ALL".to_string()).await?;
        info!("Jena Fuseki database cleared");
        Ok(())
    }

    async fn close(&self) {
        if self.slot.clear().await {
            info!("Jena Fuseki connection closed");
        }
    }

    async fn driver_info(&self) -> DriverInfo {
        match self.slot.peek().await {
            Some(conn) => DriverInfo {
                db_type: GraphDbType::Jena,
                connected: true,
                url: Some(trim_url(&conn.config.endpoint)),
                database: Some(conn.config.dataset.clone()),
                has_auth: conn.config.username.is_some() && conn.config.password.is_some(),
            },
            None => DriverInfo::disconnected(GraphDbType::Jena),
        }
    }
}
