//! Runtime settings endpoints

use super::AppState;
use crate::error::{AppError, AppJson};
use crate::settings::GRAPH_DB_TYPE_KEY;
use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// GET /api/settings query
#[derive(Debug, Default, Deserialize)]
pub struct SettingsQuery {
    key: Option<String>,
}

/// GET /api/settings - One setting or all of them
///
/// `graph_db_type` always reports the effective backend, falling back to the
/// configured default.
pub async fn get_settings(
    State(state): State<AppState>,
    Query(query): Query<SettingsQuery>,
) -> Json<Value> {
    let effective = state
        .settings
        .graph_db_type(state.config.graph.default_type)
        .to_string();

    if let Some(key) = query.key.filter(|k| !k.is_empty()) {
        let value = if key == GRAPH_DB_TYPE_KEY {
            Value::String(effective)
        } else {
            state.settings.get(&key).unwrap_or(Value::Null)
        };
        let mut body = Map::new();
        body.insert(key, value);
        return Json(Value::Object(body));
    }

    let mut settings = state.settings.snapshot();
    settings.insert(GRAPH_DB_TYPE_KEY.to_string(), Value::String(effective));
    Json(json!({ "settings": settings }))
}

/// POST /api/settings body
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    settings: Option<Value>,
}

/// Confirmation of an update
#[derive(Debug, Serialize)]
pub struct UpdateSettingsResponse {
    success: bool,
    message: String,
}

/// POST /api/settings - Merge settings
pub async fn update_settings(
    State(state): State<AppState>,
    AppJson(body): AppJson<UpdateSettingsRequest>,
) -> Result<Json<UpdateSettingsResponse>, AppError> {
    let Some(Value::Object(updates)) = body.settings else {
        return Err(AppError::BadRequest("Settings object is required".to_string()));
    };
    state.settings.merge(updates);

    Ok(Json(UpdateSettingsResponse {
        success: true,
        message: "Settings updated successfully".to_string(),
    }))
}
