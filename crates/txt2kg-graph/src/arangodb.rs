//! ArangoDB backend over the HTTP API

use crate::config::{ArangoConfig, ConnectionParams};
use crate::error::GraphDbError;
use crate::http::{build_client, check_status, trim_url, with_auth};
use crate::store::{valid_triples, ConnectionSlot, DriverInfo, GraphStore};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};
use txt2kg_domain::{GraphData, GraphDbType, Node, Relationship, Triple};

/// Document collection holding entities
pub const ENTITY_COLLECTION: &str = "entities";

/// Edge collection holding relationships
pub const EDGE_COLLECTION: &str = "relationships";

const EDGE_COLLECTION_TYPE: u8 = 3;
const CURSOR_BATCH_SIZE: usize = 1000;

const UPSERT_ENTITIES: &str = "FOR name IN @names \
     UPSERT { name: name } INSERT { name: name } UPDATE {} IN entities \
     RETURN { name: NEW.name, id: NEW._id }";

const UPSERT_EDGES: &str = "FOR e IN @edges \
     UPSERT { _from: e._from, _to: e._to, type: e.type } \
     INSERT { _from: e._from, _to: e._to, type: e.type } \
     UPDATE {} IN relationships";

const ALL_ENTITIES: &str = "FOR d IN entities RETURN { id: d._id, name: d.name }";
const ALL_EDGES: &str =
    "FOR e IN relationships RETURN { id: e._id, source: e._from, target: e._to, type: e.type }";

#[derive(Debug, Deserialize)]
struct CursorPage<T> {
    #[serde(default = "Vec::new")]
    result: Vec<T>,
    #[serde(default, rename = "hasMore")]
    has_more: bool,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntityRow {
    id: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EdgeRow {
    id: String,
    source: String,
    target: String,
    #[serde(rename = "type")]
    rel_type: Option<String>,
}

#[derive(Clone)]
struct ArangoConnection {
    client: Client,
    config: ArangoConfig,
}

impl ArangoConnection {
    fn request(&self, method: Method, db: &str, path: &str) -> RequestBuilder {
        let url = format!("{}/_db/{}/{}", trim_url(&self.config.url), db, path);
        with_auth(
            self.client.request(method, url),
            self.config.username.as_deref(),
            self.config.password.as_deref(),
        )
    }

    /// Send a create request; 409 (already exists) counts as success
    async fn ensure(&self, request: RequestBuilder) -> Result<(), GraphDbError> {
        let response = request.send().await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        check_status(response).await?;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), GraphDbError> {
        let db = &self.config.database;
        self.ensure(
            self.request(Method::POST, "_system", "_api/database")
                .json(&json!({ "name": db })),
        )
        .await?;
        self.ensure(
            self.request(Method::POST, db, "_api/collection")
                .json(&json!({ "name": ENTITY_COLLECTION })),
        )
        .await?;
        self.ensure(
            self.request(Method::POST, db, "_api/collection")
                .json(&json!({ "name": EDGE_COLLECTION, "type": EDGE_COLLECTION_TYPE })),
        )
        .await
    }

    /// Run an AQL query and collect every page of the cursor
    async fn query<T: DeserializeOwned>(
        &self,
        aql: &str,
        bind_vars: Value,
    ) -> Result<Vec<T>, GraphDbError> {
        let db = &self.config.database;
        let response = self
            .request(Method::POST, db, "_api/cursor")
            .json(&json!({ "query": aql, "bindVars": bind_vars, "batchSize": CURSOR_BATCH_SIZE }))
            .send()
            .await?;
        let mut page: CursorPage<T> = check_status(response).await?.json().await?;
        let mut rows = std::mem::take(&mut page.result);

        while page.has_more {
            let Some(cursor_id) = page.id.take() else {
                return Err(GraphDbError::InvalidResponse(
                    "cursor has more results but no id".to_string(),
                ));
            };
            debug!("Fetching next cursor page {}", cursor_id);
            let response = self
                .request(Method::POST, db, &format!("_api/cursor/{}", cursor_id))
                .send()
                .await?;
            page = check_status(response).await?.json().await?;
            rows.append(&mut page.result);
        }
        Ok(rows)
    }
}

/// ArangoDB graph store
pub struct ArangoStore {
    slot: ConnectionSlot<ArangoConnection>,
}

impl ArangoStore {
    /// Create an uninitialized store
    pub fn new() -> Self {
        Self {
            slot: ConnectionSlot::new(GraphDbType::ArangoDb),
        }
    }
}

impl Default for ArangoStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for ArangoStore {
    fn db_type(&self) -> GraphDbType {
        GraphDbType::ArangoDb
    }

    async fn initialize(&self, params: ConnectionParams) -> Result<(), GraphDbError> {
        let given = params.db_type();
        let ConnectionParams::ArangoDb(config) = params else {
            return Err(GraphDbError::Config(format!(
                "expected ArangoDB parameters, got {}",
                given
            )));
        };

        let conn = ArangoConnection {
            client: build_client(),
            config,
        };
        conn.ensure_schema().await?;

        info!(
            "ArangoDB initialized: {}/{}",
            trim_url(&conn.config.url),
            conn.config.database
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
        if valid.is_empty() {
            return Ok(0);
        }

        let mut seen = HashSet::new();
        let names: Vec<&str> = valid
            .iter()
            .flat_map(|t| [t.subject.as_str(), t.object.as_str()])
            .filter(|name| seen.insert(*name))
            .collect();

        let entities: Vec<EntityRow> = conn
            .query(UPSERT_ENTITIES, json!({ "names": names }))
            .await?;
        let ids: HashMap<String, String> = entities
            .into_iter()
            .filter_map(|e| Some((e.name?, e.id)))
            .collect();

        let edges: Vec<Value> = valid
            .iter()
            .filter_map(|t| {
                let from = ids.get(&t.subject)?;
                let to = ids.get(&t.object)?;
                Some(json!({ "_from": from, "_to": to, "type": t.predicate }))
            })
            .collect();
        if edges.len() < valid.len() {
            return Err(GraphDbError::InvalidResponse(format!(
                "{} entities missing after upsert",
                valid.len() - edges.len()
            )));
        }

        conn.query::<Value>(UPSERT_EDGES, json!({ "edges": edges }))
            .await?;

        info!("Imported {} triples into ArangoDB", valid.len());
        Ok(valid.len())
    }

    async fn get_graph_data(&self) -> Result<GraphData, GraphDbError> {
        let conn = self.slot.get().await?;

        let entities: Vec<EntityRow> = conn.query(ALL_ENTITIES, json!({})).await?;
        let edges: Vec<EdgeRow> = conn.query(ALL_EDGES, json!({})).await?;

        let nodes = entities
            .into_iter()
            .map(|e| Node {
                id: e.id,
                labels: vec!["Entity".to_string()],
                name: e.name,
            })
            .collect();
        let relationships = edges
            .into_iter()
            .map(|e| Relationship {
                id: e.id,
                source: e.source,
                target: e.target,
                rel_type: e.rel_type.unwrap_or_default(),
            })
            .collect();

        Ok(GraphData {
            nodes,
            relationships,
        })
    }

    async fn clear_database(&self) -> Result<(), GraphDbError> {
        let conn = self.slot.get().await?;
        for collection in [EDGE_COLLECTION, ENTITY_COLLECTION] {
            let response = conn
                .request(
                    Method::PUT,
                    &conn.config.database,
                    &format!("_api/collection/{}/truncate", collection),
                )
                .send()
                .await?;
            check_status(response).await?;
        }
        info!("ArangoDB collections truncated");
        Ok(())
    }

    async fn close(&self) {
        if self.slot.clear().await {
            info!("ArangoDB connection closed");
        }
    }

    async fn driver_info(&self) -> DriverInfo {
        match self.slot.peek().await {
            Some(conn) => DriverInfo {
                db_type: GraphDbType::ArangoDb,
                connected: true,
                url: Some(trim_url(&conn.config.url)),
                database: Some(conn.config.database.clone()),
                has_auth: conn.config.username.is_some() && conn.config.password.is_some(),
            },
            None => DriverInfo::disconnected(GraphDbType::ArangoDb),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_page_defaults() {
        let page: CursorPage<Value> = serde_json::from_str(r#"{"result": [1, 2]}"#).unwrap();
        assert_eq!(page.result.len(), 2);
        assert!(!page.has_more);
        assert!(page.id.is_none());
    }

    #[tokio::test]
    async fn test_uninitialized_store() {
        let store = ArangoStore::new();
        assert!(matches!(
            store.import_triples(&[Triple::new("a", "b", "c")]).await,
            Err(GraphDbError::NotInitialized(GraphDbType::ArangoDb))
        ));
    }
}
