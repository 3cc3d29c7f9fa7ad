//! Graph database endpoints

use super::{AppState, GraphDbQuery};
use crate::error::{AppError, AppJson};
use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use txt2kg_domain::{GraphData, GraphDbType, Node, Relationship, Triple};

const DEFAULT_LABEL: &str = "Entity";
const DEFAULT_REL_TYPE: &str = "RELATED_TO";
const ENTITY_COLOR: &str = "#ff6b6b";
const OTHER_COLOR: &str = "#4ecdc4";

/// Node as drawn by the graph viewer
#[derive(Debug, Serialize)]
pub struct ViewNode {
    id: String,
    labels: Vec<String>,
    name: String,
    label: String,
    val: u32,
    color: &'static str,
}

impl From<Node> for ViewNode {
    fn from(node: Node) -> Self {
        let name = node.name.unwrap_or_else(|| format!("Node {}", node.id));
        let label = node
            .labels
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_LABEL.to_string());
        let color = if node.labels.iter().any(|l| l == DEFAULT_LABEL) {
            ENTITY_COLOR
        } else {
            OTHER_COLOR
        };
        Self {
            id: node.id,
            labels: node.labels,
            name,
            label,
            val: 1,
            color,
        }
    }
}

/// Relationship as drawn by the graph viewer
#[derive(Debug, Serialize)]
pub struct ViewLink {
    id: String,
    source: String,
    target: String,
    #[serde(rename = "type")]
    rel_type: String,
    label: String,
}

impl From<Relationship> for ViewLink {
    fn from(rel: Relationship) -> Self {
        let label = if rel.rel_type.is_empty() {
            DEFAULT_REL_TYPE.to_string()
        } else {
            rel.rel_type.clone()
        };
        Self {
            id: rel.id,
            source: rel.source,
            target: rel.target,
            rel_type: rel.rel_type,
            label,
        }
    }
}

/// GET /api/graph-db response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphResponse {
    nodes: Vec<ViewNode>,
    links: Vec<ViewLink>,
    connection_url: String,
    database_type: GraphDbType,
}

async fn fetch_graph(
    state: &AppState,
    db_type: GraphDbType,
    query: &GraphDbQuery,
    context: &str,
) -> Result<GraphData, AppError> {
    let store = state.connect(db_type, &query.overrides()).await?;
    store
        .get_graph_data()
        .await
        .map_err(|e| AppError::internal(context, e))
}

/// GET /api/graph-db - Whole graph for visualization
pub async fn get_graph(
    State(state): State<AppState>,
    Query(query): Query<GraphDbQuery>,
) -> Result<Json<GraphResponse>, AppError> {
    let db_type = state.resolve_db_type(query.db_type.as_deref())?;
    let data = fetch_graph(&state, db_type, &query, "Failed to fetch graph data").await?;
    let connection_url = state
        .graph
        .config()
        .params_for(db_type, &query.overrides())
        .url()
        .to_string();

    info!(
        "Fetched {} nodes and {} relationships from {}",
        data.nodes.len(),
        data.relationships.len(),
        db_type
    );
    Ok(Json(GraphResponse {
        nodes: data.nodes.into_iter().map(ViewNode::from).collect(),
        links: data.relationships.into_iter().map(ViewLink::from).collect(),
        connection_url,
        database_type: db_type,
    }))
}

/// Body carrying raw triples; entries are checked individually
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriplesBody {
    #[serde(default)]
    triples: Option<Vec<Value>>,
    #[serde(default)]
    document_name: Option<String>,
}

/// Keep entries with non-blank string subject, predicate and object
pub(crate) fn valid_triples(raw: Vec<Value>) -> Vec<Triple> {
    let total = raw.len();
    let triples: Vec<Triple> = raw
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Triple>(v).ok())
        .filter(Triple::is_valid)
        .collect();
    if triples.len() < total {
        warn!("Dropped {} invalid triples", total - triples.len());
    }
    triples
}

/// POST /api/graph-db response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    success: bool,
    message: String,
    count: usize,
    database_type: GraphDbType,
}

/// POST /api/graph-db - Import triples
pub async fn import_triples(
    State(state): State<AppState>,
    Query(query): Query<GraphDbQuery>,
    AppJson(body): AppJson<TriplesBody>,
) -> Result<Json<ImportResponse>, AppError> {
    let raw = body.triples.ok_or_else(|| {
        AppError::BadRequest("Invalid request: triples array is required".to_string())
    })?;
    let db_type = state.resolve_db_type(query.db_type.as_deref())?;
    let store = state.connect(db_type, &query.overrides()).await?;

    let count = store
        .import_triples(&valid_triples(raw))
        .await
        .map_err(|e| AppError::internal("Failed to import triples", e))?;

    Ok(Json(ImportResponse {
        success: true,
        message: format!("Successfully imported {} triples into {}", count, db_type),
        count,
        database_type: db_type,
    }))
}

/// GET /api/graph-db/triples response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriplesResponse {
    success: bool,
    triples: Vec<Triple>,
    count: usize,
    database_type: GraphDbType,
}

/// GET /api/graph-db/triples - Stored graph as deduplicated triples
pub async fn get_triples(
    State(state): State<AppState>,
    Query(query): Query<GraphDbQuery>,
) -> Result<Json<TriplesResponse>, AppError> {
    let db_type = state.resolve_db_type(query.db_type.as_deref())?;
    let triples = fetch_graph(&state, db_type, &query, "Failed to fetch triples")
        .await?
        .to_triples();

    info!("Fetched {} unique triples from {}", triples.len(), db_type);
    Ok(Json(TriplesResponse {
        success: true,
        count: triples.len(),
        triples,
        database_type: db_type,
    }))
}

/// POST /api/graph-db/triples response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreResponse {
    success: bool,
    message: String,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_name: Option<String>,
    database_type: GraphDbType,
}

/// POST /api/graph-db/triples - Store the valid triples of a document
pub async fn store_triples(
    State(state): State<AppState>,
    Query(query): Query<GraphDbQuery>,
    AppJson(body): AppJson<TriplesBody>,
) -> Result<Json<StoreResponse>, AppError> {
    let raw = body
        .triples
        .ok_or_else(|| AppError::BadRequest("Triples are required".to_string()))?;
    let db_type = state.resolve_db_type(query.db_type.as_deref())?;
    info!(
        "Storing {} triples in {} from document \"{}\"",
        raw.len(),
        db_type,
        body.document_name.as_deref().unwrap_or("unnamed")
    );

    let store = state.connect(db_type, &query.overrides()).await?;
    let count = store
        .import_triples(&valid_triples(raw))
        .await
        .map_err(|e| AppError::internal("Failed to store triples", e))?;

    Ok(Json(StoreResponse {
        success: true,
        message: format!("Triples stored successfully in {}", db_type),
        count,
        document_name: body.document_name,
        database_type: db_type,
    }))
}

/// POST /api/graph-db/clear response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    success: bool,
    message: String,
    database_type: GraphDbType,
}

/// POST /api/graph-db/clear - Delete every node and relationship
pub async fn clear_database(
    State(state): State<AppState>,
    Query(query): Query<GraphDbQuery>,
) -> Result<Json<ClearResponse>, AppError> {
    let db_type = state.resolve_db_type(query.db_type.as_deref())?;
    let store = state.connect(db_type, &query.overrides()).await?;
    store
        .clear_database()
        .await
        .map_err(|e| AppError::internal("Failed to clear database", e))?;

    Ok(Json(ClearResponse {
        success: true,
        message: format!("Successfully cleared all data from {} database", db_type),
        database_type: db_type,
    }))
}
