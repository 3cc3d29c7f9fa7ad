//! Runtime settings shared by all requests

use serde_json::{Map, Value};
use std::sync::RwLock;
use tracing::{info, warn};
use txt2kg_domain::GraphDbType;

/// Settings key selecting the graph backend
pub const GRAPH_DB_TYPE_KEY: &str = "graph_db_type";

/// Key/value settings updated through `POST /api/settings`
///
/// Handlers take a snapshot at request start; updates merge into the map.
#[derive(Debug, Default)]
pub struct SettingsStore {
    values: RwLock<Map<String, Value>>,
}

impl SettingsStore {
    /// Empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every setting
    pub fn snapshot(&self) -> Map<String, Value> {
        match self.values.read() {
            Ok(values) => values.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// One setting
    pub fn get(&self, key: &str) -> Option<Value> {
        self.snapshot().remove(key)
    }

    /// Merge `updates` into the settings, replacing existing keys
    pub fn merge(&self, updates: Map<String, Value>) {
        if let Some(db_type) = updates.get(GRAPH_DB_TYPE_KEY) {
            info!("Setting graph database type to: {}", db_type);
        }
        let mut values = match self.values.write() {
            Ok(values) => values,
            Err(poisoned) => poisoned.into_inner(),
        };
        values.extend(updates);
    }

    /// Graph backend from the settings, else `default`
    ///
    /// Unparseable values are ignored with a warning.
    pub fn graph_db_type(&self, default: GraphDbType) -> GraphDbType {
        match self.get(GRAPH_DB_TYPE_KEY) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.parse().unwrap_or_else(|e| {
                warn!("Ignoring {} setting: {}", GRAPH_DB_TYPE_KEY, e);
                default
            }),
            _ => default,
        }
    }
}
