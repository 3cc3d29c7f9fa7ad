//! Connection configuration for the graph backends

use serde::{Deserialize, Serialize};
use tracing::warn;
use txt2kg_domain::GraphDbType;

/// Neo4j connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Neo4jConfig {
    /// `bolt://`, `neo4j://` or `http(s)://` URI
    pub uri: String,
    /// Database name used in `/db/{database}/tx/commit`
    pub database: String,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            database: "neo4j".to_string(),
            username: Some("neo4j".to_string()),
            password: None,
        }
    }
}

/// ArangoDB connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArangoConfig {
    /// Server URL
    pub url: String,
    /// Database name, created on initialize when missing
    pub database: String,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
}

impl Default for ArangoConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8529".to_string(),
            database: "txt2kg".to_string(),
            username: None,
            password: None,
        }
    }
}

/// Jena Fuseki connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JenaConfig {
    /// Fuseki server endpoint
    pub endpoint: String,
    /// Dataset name
    pub dataset: String,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
}

impl Default for JenaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3030".to_string(),
            dataset: "txt2kg".to_string(),
            username: None,
            password: None,
        }
    }
}

/// Fully resolved parameters handed to `GraphStore::initialize`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionParams {
    /// Neo4j
    Neo4j(Neo4jConfig),
    /// ArangoDB
    ArangoDb(ArangoConfig),
    /// Jena Fuseki
    Jena(JenaConfig),
}

impl ConnectionParams {
    /// Backend these parameters are for
    pub fn db_type(&self) -> GraphDbType {
        match self {
            ConnectionParams::Neo4j(_) => GraphDbType::Neo4j,
            ConnectionParams::ArangoDb(_) => GraphDbType::ArangoDb,
            ConnectionParams::Jena(_) => GraphDbType::Jena,
        }
    }

    /// Server address, for display
    pub fn url(&self) -> &str {
        match self {
            ConnectionParams::Neo4j(c) => &c.uri,
            ConnectionParams::ArangoDb(c) => &c.url,
            ConnectionParams::Jena(c) => &c.endpoint,
        }
    }
}

/// Per-request connection overrides (query string parameters)
///
/// `database` is the Neo4j database, the ArangoDB database or the Fuseki
/// dataset depending on the backend. Blank values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOverrides {
    /// Server URL or endpoint
    pub url: Option<String>,
    /// Database or dataset name
    pub database: Option<String>,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ConnectionOverrides {
    /// True when no override carries a value
    pub fn is_empty(&self) -> bool {
        non_blank(&self.url).is_none()
            && non_blank(&self.database).is_none()
            && non_blank(&self.username).is_none()
            && non_blank(&self.password).is_none()
    }

    fn apply(
        &self,
        url: &mut String,
        database: &mut String,
        username: &mut Option<String>,
        password: &mut Option<String>,
    ) {
        if let Some(v) = non_blank(&self.url) {
            *url = v;
        }
        if let Some(v) = non_blank(&self.database) {
            *database = v;
        }
        if let Some(v) = non_blank(&self.username) {
            *username = Some(v);
        }
        if let Some(v) = non_blank(&self.password) {
            *password = Some(v);
        }
    }
}

/// Graph database configuration for all backends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphDbConfig {
    /// Backend used when neither the request nor the settings pick one
    pub default_type: GraphDbType,
    /// Neo4j settings
    pub neo4j: Neo4jConfig,
    /// ArangoDB settings
    pub arangodb: ArangoConfig,
    /// Jena settings
    pub jena: JenaConfig,
}

impl GraphDbConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let urls = [
            ("neo4j.uri", &self.neo4j.uri),
            ("arangodb.url", &self.arangodb.url),
            ("jena.endpoint", &self.jena.endpoint),
        ];
        for (name, url) in urls {
            if url.trim().is_empty() {
                return Err(format!("{} must not be empty", name));
            }
        }
        let names = [
            ("neo4j.database", &self.neo4j.database),
            ("arangodb.database", &self.arangodb.database),
            ("jena.dataset", &self.jena.dataset),
        ];
        for (name, value) in names {
            if value.trim().is_empty() {
                return Err(format!("{} must not be empty", name));
            }
        }
        Ok(())
    }

    /// Apply `DEFAULT_GRAPH_DB_TYPE`, `NEO4J_*`, `ARANGODB_*` and `JENA_*` variables
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides from an arbitrary lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("DEFAULT_GRAPH_DB_TYPE") {
            match v.parse() {
                Ok(db_type) => self.default_type = db_type,
                Err(e) => warn!("Ignoring DEFAULT_GRAPH_DB_TYPE: {}", e),
            }
        }

        if let Some(v) = lookup("NEO4J_URI") {
            self.neo4j.uri = v;
        }
        if let Some(v) = lookup("NEO4J_USER").or_else(|| lookup("NEO4J_USERNAME")) {
            self.neo4j.username = Some(v);
        }
        if let Some(v) = lookup("NEO4J_PASSWORD") {
            self.neo4j.password = Some(v);
        }
        if let Some(v) = lookup("NEO4J_DATABASE") {
            self.neo4j.database = v;
        }

        if let Some(v) = lookup("ARANGODB_URL") {
            self.arangodb.url = v;
        }
        if let Some(v) = lookup("ARANGODB_DB") {
            self.arangodb.database = v;
        }
        if let Some(v) = lookup("ARANGODB_USER") {
            self.arangodb.username = Some(v);
        }
        if let Some(v) = lookup("ARANGODB_PASSWORD") {
            self.arangodb.password = Some(v);
        }

        if let Some(v) = lookup("JENA_ENDPOINT") {
            self.jena.endpoint = v;
        }
        if let Some(v) = lookup("JENA_DATASET") {
            self.jena.dataset = v;
        }
        if let Some(v) = lookup("JENA_USERNAME") {
            self.jena.username = Some(v);
        }
        if let Some(v) = lookup("JENA_PASSWORD") {
            self.jena.password = Some(v);
        }
    }

    /// Resolve connection parameters for a backend; overrides win
    pub fn params_for(
        &self,
        db_type: GraphDbType,
        overrides: &ConnectionOverrides,
    ) -> ConnectionParams {
        match db_type {
            GraphDbType::Neo4j => {
                let mut c = self.neo4j.clone();
                overrides.apply(&mut c.uri, &mut c.database, &mut c.username, &mut c.password);
                ConnectionParams::Neo4j(c)
            }
            GraphDbType::ArangoDb => {
                let mut c = self.arangodb.clone();
                overrides.apply(&mut c.url, &mut c.database, &mut c.username, &mut c.password);
                ConnectionParams::ArangoDb(c)
            }
            GraphDbType::Jena => {
                let mut c = self.jena.clone();
                overrides.apply(
                    &mut c.endpoint,
                    &mut c.dataset,
                    &mut c.username,
                    &mut c.password,
                );
                ConnectionParams::Jena(c)
            }
        }
    }
}
