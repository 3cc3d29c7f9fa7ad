//! HTTP request handlers
//!
//! One module per resource; this module holds the shared state, the router
//! and the graph backend resolution used by several resources.

mod backend;
mod extract;
mod graph;
mod ollama;
mod proxy;
mod query_log;
mod settings;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::query_log::QueryLogger;
use crate::settings::SettingsStore;
use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use txt2kg_domain::GraphDbType;
use txt2kg_graph::{ConnectionOverrides, GraphStore, GraphStoreRegistry};
use txt2kg_vector::TripleIndex;

/// Timeout applied to proxied requests
const PROXY_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    /// Runtime settings
    pub settings: Arc<SettingsStore>,
    /// Graph backends
    pub graph: Arc<GraphStoreRegistry>,
    /// Triple embeddings
    pub vectors: TripleIndex,
    /// Query performance log
    pub query_log: Arc<QueryLogger>,
    /// Client for the remote WebGPU passthrough
    pub http: reqwest::Client,
}

impl AppState {
    /// State with the backends selected by `config`
    pub fn new(config: ServerConfig) -> Self {
        let graph = Arc::new(GraphStoreRegistry::new(config.graph.clone()));
        let vectors = config.vector.build_triple_index();
        let query_log = Arc::new(QueryLogger::new(config.query_log_path.clone()));
        Self::with_parts(config, graph, vectors, query_log)
    }

    /// State from already-built parts
    pub fn with_parts(
        config: ServerConfig,
        graph: Arc<GraphStoreRegistry>,
        vectors: TripleIndex,
        query_log: Arc<QueryLogger>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(PROXY_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build proxy HTTP client ({}), using defaults", e);
                reqwest::Client::new()
            });
        Self {
            config: Arc::new(config),
            settings: Arc::new(SettingsStore::new()),
            graph,
            vectors,
            query_log,
            http,
        }
    }

    /// Graph backend for a request
    ///
    /// An explicit `?type=` wins, then the `graph_db_type` setting, then the
    /// configured default.
    pub fn resolve_db_type(&self, requested: Option<&str>) -> Result<GraphDbType, AppError> {
        match requested.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Unsupported graph database type: {}", s))),
            None => Ok(self.settings.graph_db_type(self.config.graph.default_type)),
        }
    }

    /// Initialized store for `db_type`
    pub async fn connect(
        &self,
        db_type: GraphDbType,
        overrides: &ConnectionOverrides,
    ) -> Result<Arc<dyn GraphStore>, AppError> {
        self.graph
            .connect(db_type, overrides)
            .await
            .map_err(|e| AppError::internal(&format!("Failed to connect to {}", db_type), e))
    }
}

/// Graph backend selection and connection overrides from the query string
///
/// `url` and `endpoint` both set the server URL; `dbName` and `dataset`
/// both set the database.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDbQuery {
    /// Backend type
    #[serde(rename = "type")]
    pub db_type: Option<String>,
    /// Server URL (Neo4j, ArangoDB)
    pub url: Option<String>,
    /// Server URL (Fuseki)
    pub endpoint: Option<String>,
    /// Database (Neo4j, ArangoDB)
    pub db_name: Option<String>,
    /// Dataset (Fuseki)
    pub dataset: Option<String>,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
}

impl GraphDbQuery {
    /// Connection overrides carried by the query
    pub fn overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            url: self.url.clone().or_else(|| self.endpoint.clone()),
            database: self.db_name.clone().or_else(|| self.dataset.clone()),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Always "ok" while the process serves requests
    pub status: String,
}

/// GET /health - Liveness check
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/extract-triples", post(extract::extract_triples))
        .route("/api/extract-triples/batch", post(extract::extract_batch))
        .route(
            "/api/ollama",
            get(ollama::test_connection).post(ollama::extract_triples),
        )
        .route(
            "/api/graph-db",
            get(graph::get_graph).post(graph::import_triples),
        )
        .route(
            "/api/graph-db/triples",
            get(graph::get_triples).post(graph::store_triples),
        )
        .route("/api/graph-db/clear", post(graph::clear_database))
        .route(
            "/api/settings",
            get(settings::get_settings).post(settings::update_settings),
        )
        .route(
            "/api/query-log",
            get(query_log::get_logs).post(query_log::log_query),
        )
        .route(
            "/api/backend",
            get(backend::query_backend).post(backend::create_backend),
        )
        .route(
            "/api/remote-webgpu/*path",
            get(proxy::proxy_get)
                .post(proxy::proxy_post)
                .delete(proxy::proxy_delete),
        )
        .with_state(state)
}
