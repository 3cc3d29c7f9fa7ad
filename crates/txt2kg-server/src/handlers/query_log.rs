//! Query log endpoints

use super::AppState;
use crate::error::{AppError, AppJson};
use crate::query_log::{QueryLogEntry, QueryMetrics, QueryMode, DEFAULT_LIMIT};
use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// GET /api/query-log query
#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    limit: Option<usize>,
}

/// Logged queries, newest first
#[derive(Debug, Serialize)]
pub struct LogsResponse {
    logs: Vec<QueryLogEntry>,
}

/// GET /api/query-log - Recent queries
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let logs = state
        .query_log
        .recent(limit)
        .await
        .map_err(|e| AppError::internal("Failed to read query log", e))?;
    info!("Retrieved {} query logs", logs.len());
    Ok(Json(LogsResponse { logs }))
}

/// POST /api/query-log body
///
/// Fields are loosely typed so each missing one gets its own message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQueryRequest {
    query: Option<String>,
    query_mode: Option<Value>,
    metrics: Option<Value>,
}

/// Confirmation of a logged query
#[derive(Debug, Serialize)]
pub struct LogQueryResponse {
    success: bool,
    id: String,
}

fn missing(field: &str) -> AppError {
    AppError::BadRequest(format!("Missing required field: {}", field))
}

/// POST /api/query-log - Record a query and its metrics
pub async fn log_query(
    State(state): State<AppState>,
    AppJson(body): AppJson<LogQueryRequest>,
) -> Result<Json<LogQueryResponse>, AppError> {
    let query = body
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| missing("query"))?;
    let mode_value = body
        .query_mode
        .filter(|m| !m.is_null())
        .ok_or_else(|| missing("queryMode"))?;
    let metrics_value = body
        .metrics
        .filter(Value::is_object)
        .ok_or_else(|| missing("metrics"))?;

    let query_mode: QueryMode = serde_json::from_value(mode_value.clone())
        .map_err(|_| AppError::BadRequest(format!("Invalid queryMode: {}", mode_value)))?;
    let metrics: QueryMetrics = serde_json::from_value(metrics_value)
        .map_err(|e| AppError::BadRequest(format!("Invalid metrics: {}", e)))?;

    let entry = state
        .query_log
        .log(&query, query_mode, metrics)
        .await
        .map_err(|e| AppError::internal("Failed to write query log", e))?;

    Ok(Json(LogQueryResponse {
        success: true,
        id: entry.id,
    }))
}
