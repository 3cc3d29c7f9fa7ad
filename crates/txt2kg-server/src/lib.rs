//! txt2kg Server
//!
//! HTTP surface of the pipeline: triple extraction, graph database import and
//! export, semantic search over triples, runtime settings, the query log and
//! a passthrough to the remote WebGPU clustering service.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod query_log;
pub mod settings;

use config::ServerConfig;
use handlers::{create_router, AppState};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Start the HTTP server
///
/// Builds the graph store registry, vector index and query log from the
/// configuration and serves until the process is stopped.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    info!("Starting txt2kg server");
    info!("Bind address: {}", config.bind_addr());
    info!("Default graph database: {}", config.graph.default_type);
    info!(
        "LLM provider: {} ({})",
        config.llm.provider,
        config.llm.active_model()
    );
    info!("Query log: {}", config.query_log_path.display());

    let bind_addr = config.bind_addr();
    let state = AppState::new(config);
    let graph = state.graph.clone();

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    let served = axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()));

    graph.close_all().await;
    served
}
