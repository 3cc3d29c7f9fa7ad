//! Graph store instances shared across requests

use crate::arangodb::ArangoStore;
use crate::config::{ConnectionOverrides, ConnectionParams, GraphDbConfig};
use crate::error::GraphDbError;
use crate::jena::JenaStore;
use crate::neo4j::Neo4jStore;
use crate::store::GraphStore;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use txt2kg_domain::GraphDbType;

/// Stores kept for connections that override the configured parameters
const MAX_OVERRIDE_STORES: usize = 16;

/// A store bound to one set of connection parameters
struct OverrideStore {
    params: ConnectionParams,
    store: Arc<dyn GraphStore>,
}

/// Owns one store per backend type
///
/// Built once by the process entry point and shared by reference. The shared
/// store of a type only ever connects with the configured parameters; a
/// request that overrides them gets its own store, cached by parameters.
pub struct GraphStoreRegistry {
    config: GraphDbConfig,
    neo4j: Arc<dyn GraphStore>,
    arangodb: Arc<dyn GraphStore>,
    jena: Arc<dyn GraphStore>,
    // Oldest first
    overridden: Mutex<Vec<OverrideStore>>,
}

fn builtin_store(db_type: GraphDbType) -> Arc<dyn GraphStore> {
    match db_type {
        GraphDbType::Neo4j => Arc::new(Neo4jStore::new()),
        GraphDbType::ArangoDb => Arc::new(ArangoStore::new()),
        GraphDbType::Jena => Arc::new(JenaStore::new()),
    }
}

impl GraphStoreRegistry {
    /// Registry with the built-in HTTP backends
    pub fn new(config: GraphDbConfig) -> Self {
        Self::with_stores(
            config,
            builtin_store(GraphDbType::Neo4j),
            builtin_store(GraphDbType::ArangoDb),
            builtin_store(GraphDbType::Jena),
        )
    }

    /// Registry with caller-provided shared stores
    ///
    /// Connections with overridden parameters still use the built-in backends.
    pub fn with_stores(
        config: GraphDbConfig,
        neo4j: Arc<dyn GraphStore>,
        arangodb: Arc<dyn GraphStore>,
        jena: Arc<dyn GraphStore>,
    ) -> Self {
        Self {
            config,
            neo4j,
            arangodb,
            jena,
            overridden: Mutex::new(Vec::new()),
        }
    }

    /// Configuration the registry resolves connections from
    pub fn config(&self) -> &GraphDbConfig {
        &self.config
    }

    /// The shared store for a backend type; the same instance on every call
    pub fn get(&self, db_type: GraphDbType) -> Arc<dyn GraphStore> {
        match db_type {
            GraphDbType::Neo4j => Arc::clone(&self.neo4j),
            GraphDbType::ArangoDb => Arc::clone(&self.arangodb),
            GraphDbType::Jena => Arc::clone(&self.jena),
        }
    }

    fn overridden(&self) -> MutexGuard<'_, Vec<OverrideStore>> {
        self.overridden.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store bound to `params`, created on first use
    fn store_for(&self, params: &ConnectionParams) -> Arc<dyn GraphStore> {
        let mut stores = self.overridden();
        if let Some(existing) = stores.iter().find(|s| &s.params == params) {
            return Arc::clone(&existing.store);
        }

        if stores.len() >= MAX_OVERRIDE_STORES {
            let evicted = stores.remove(0);
            debug!("Dropping cached {} store for {}", evicted.params.db_type(), evicted.params.url());
        }
        let store = builtin_store(params.db_type());
        stores.push(OverrideStore {
            params: params.clone(),
            store: Arc::clone(&store),
        });
        store
    }

    /// Return an initialized store for `db_type`
    ///
    /// Without overrides this is the shared store. Overridden parameters get
    /// a store of their own, so two requests with different targets never
    /// share a connection. No lock is held while a store connects.
    pub async fn connect(
        &self,
        db_type: GraphDbType,
        overrides: &ConnectionOverrides,
    ) -> Result<Arc<dyn GraphStore>, GraphDbError> {
        let params = self.config.params_for(db_type, overrides);
        let store = if params == self.config.params_for(db_type, &ConnectionOverrides::default()) {
            self.get(db_type)
        } else {
            self.store_for(&params)
        };

        if !store.is_initialized().await {
            info!("Connecting {} store at {}", db_type, params.url());
            store.initialize(params).await?;
        }
        Ok(store)
    }

    /// Close every store and forget the overridden ones
    pub async fn close_all(&self) {
        let overridden: Vec<OverrideStore> = std::mem::take(&mut *self.overridden());
        for entry in overridden {
            entry.store.close().await;
        }
        for db_type in GraphDbType::ALL {
            self.get(db_type).close().await;
        }
    }
}
