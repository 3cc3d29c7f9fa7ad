//! The `GraphStore` trait and the connection slot shared by its backends

use crate::config::ConnectionParams;
use crate::error::GraphDbError;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use txt2kg_domain::{GraphData, GraphDbType, Triple};

/// Connection summary reported by `GraphStore::driver_info`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverInfo {
    /// Backend type
    pub db_type: GraphDbType,
    /// True while the store is initialized
    pub connected: bool,
    /// Server address, when connected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Database or dataset, when connected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// True when credentials are configured
    pub has_auth: bool,
}

impl DriverInfo {
    pub(crate) fn disconnected(db_type: GraphDbType) -> Self {
        Self {
            db_type,
            connected: false,
            url: None,
            database: None,
            has_auth: false,
        }
    }
}

/// A graph database backend
///
/// Stores start uninitialized. `initialize` publishes a connection only after
/// it fully succeeds; every data operation fails with
/// [`GraphDbError::NotInitialized`] until then, and again after `close`.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Backend type
    fn db_type(&self) -> GraphDbType;

    /// Connect, verify and publish the connection (replacing any previous one)
    async fn initialize(&self, params: ConnectionParams) -> Result<(), GraphDbError>;

    /// True when a connection is published
    async fn is_initialized(&self) -> bool;

    /// Store triples, returning how many valid triples were written
    ///
    /// Triples with an empty field are skipped and not counted.
    async fn import_triples(&self, triples: &[Triple]) -> Result<usize, GraphDbError>;

    /// Export every node and relationship
    async fn get_graph_data(&self) -> Result<GraphData, GraphDbError>;

    /// Remove all data
    async fn clear_database(&self) -> Result<(), GraphDbError>;

    /// Drop the connection
    async fn close(&self);

    /// Connection summary
    async fn driver_info(&self) -> DriverInfo;
}

/// Holds a backend's published connection
///
/// The connection is cloned out for each operation so the lock is never held
/// across network I/O.
pub(crate) struct ConnectionSlot<C> {
    db_type: GraphDbType,
    inner: RwLock<Option<C>>,
}

impl<C: Clone> ConnectionSlot<C> {
    pub(crate) fn new(db_type: GraphDbType) -> Self {
        Self {
            db_type,
            inner: RwLock::new(None),
        }
    }

    pub(crate) async fn get(&self) -> Result<C, GraphDbError> {
        self.inner
            .read()
            .await
            .clone()
            .ok_or(GraphDbError::NotInitialized(self.db_type))
    }

    pub(crate) async fn peek(&self) -> Option<C> {
        self.inner.read().await.clone()
    }

    pub(crate) async fn publish(&self, conn: C) {
        *self.inner.write().await = Some(conn);
    }

    pub(crate) async fn clear(&self) -> bool {
        self.inner.write().await.take().is_some()
    }

    pub(crate) async fn is_set(&self) -> bool {
        self.inner.read().await.is_some()
    }
}

/// Keep only triples with three non-empty fields, trimmed
pub(crate) fn valid_triples(triples: &[Triple]) -> Vec<Triple> {
    triples
        .iter()
        .filter(|t| t.is_valid())
        .map(|t| {
            Triple::new(t.subject.trim(), t.predicate.trim(), t.object.trim())
        })
        .collect()
}
