//! Knowledge-graph backend: graph storage plus triple embeddings

use super::graph::valid_triples;
use super::AppState;
use crate::error::{AppError, AppJson};
use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use txt2kg_domain::GraphDbType;
use txt2kg_graph::ConnectionOverrides;
use txt2kg_vector::ScoredTriple;

/// POST /api/backend body
#[derive(Debug, Deserialize)]
pub struct CreateBackendRequest {
    #[serde(default)]
    triples: Option<Vec<Value>>,
}

/// POST /api/backend response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBackendResponse {
    success: bool,
    message: String,
    stored: usize,
    indexed: usize,
    graph_db_type: GraphDbType,
}

/// POST /api/backend - Store triples in the graph and index their embeddings
pub async fn create_backend(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateBackendRequest>,
) -> Result<Json<CreateBackendResponse>, AppError> {
    let raw = body.triples.filter(|t| !t.is_empty()).ok_or_else(|| {
        AppError::BadRequest("Triples are required and must be a non-empty array".to_string())
    })?;
    let submitted = raw.len();
    let triples = valid_triples(raw);

    let db_type = state.resolve_db_type(None)?;
    let store = state.connect(db_type, &ConnectionOverrides::default()).await?;
    let stored = store
        .import_triples(&triples)
        .await
        .map_err(|e| AppError::internal("Failed to store triples", e))?;
    let indexed = state
        .vectors
        .index_triples(&triples)
        .await
        .map_err(|e| AppError::internal("Failed to index triples", e))?;

    info!(
        "Backend created: {} triples stored in {}, {} embedded",
        stored, db_type, indexed
    );
    Ok(Json(CreateBackendResponse {
        success: true,
        message: format!("Created backend successfully with {} triples", submitted),
        stored,
        indexed,
        graph_db_type: db_type,
    }))
}

/// GET /api/backend query
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendQuery {
    query: Option<String>,
    top_k: Option<usize>,
}

/// GET /api/backend response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendQueryResponse {
    query: String,
    triples: Vec<ScoredTriple>,
    count: usize,
    top_k: usize,
    graph_db_type: GraphDbType,
}

/// GET /api/backend - Triples most similar to a text query
pub async fn query_backend(
    State(state): State<AppState>,
    Query(params): Query<BackendQuery>,
) -> Result<Json<BackendQueryResponse>, AppError> {
    let query = params
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Query parameter is required".to_string()))?;
    let top_k = params
        .top_k
        .filter(|k| *k > 0)
        .unwrap_or(state.config.vector.default_top_k);

    let triples = state
        .vectors
        .search(&query, top_k)
        .await
        .map_err(|e| AppError::internal("Failed to query backend", e))?;

    Ok(Json(BackendQueryResponse {
        count: triples.len(),
        query,
        triples,
        top_k,
        graph_db_type: state.resolve_db_type(None)?,
    }))
}
