//! HTTP client for the txt2kg server.

use crate::error::{CliError, Result};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use txt2kg_domain::Triple;

/// Extraction runs one LLM call per chunk, so allow plenty of time
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Extraction options sent with `POST /api/extract-triples`
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOptions {
    /// Provider name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,
    /// Ollama model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_model: Option<String>,
    /// vLLM model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vllm_model: Option<String>,
    /// NVIDIA model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nvidia_model: Option<String>,
    /// Characters per chunk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    /// Characters shared by neighbouring chunks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap_size: Option<usize>,
}

impl ExtractOptions {
    /// Route `model` to the field of the chosen provider (Ollama by default)
    pub fn with_model(mut self, model: Option<String>) -> Self {
        match self.llm_provider.as_deref().map(str::to_lowercase).as_deref() {
            Some("vllm") => self.vllm_model = model,
            Some("nvidia") => self.nvidia_model = model,
            _ => self.ollama_model = model,
        }
        self
    }
}

/// Extraction result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    /// Extracted triples
    pub triples: Vec<Triple>,
    /// Chunks sent to the LLM
    pub chunk_count: usize,
    /// Provider used
    pub llm_provider: String,
    /// Model used
    pub model: String,
}

/// Triples stored in the graph database
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTriples {
    /// Deduplicated triples
    pub triples: Vec<Triple>,
    /// Backend that answered
    pub database_type: String,
}

/// Confirmation of a write
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    /// Human-readable outcome
    pub message: String,
    /// Triples written, when the endpoint reports it
    #[serde(default)]
    pub count: Option<usize>,
}

/// Node of the graph view
#[derive(Debug, Clone, Deserialize)]
pub struct GraphNode {
    /// Backend id
    pub id: String,
    /// Display name
    pub name: String,
}

/// Edge of the graph view
#[derive(Debug, Clone, Deserialize)]
pub struct GraphLink {
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Display label
    pub label: String,
}

/// Graph as returned by `GET /api/graph-db`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphView {
    /// Nodes
    pub nodes: Vec<GraphNode>,
    /// Edges
    pub links: Vec<GraphLink>,
    /// Backend URL
    pub connection_url: String,
    /// Backend type
    pub database_type: String,
}

/// Triple with its similarity score
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    /// Subject
    pub subject: String,
    /// Predicate
    pub predicate: String,
    /// Object
    pub object: String,
    /// Similarity to the query
    pub score: f32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    triples: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for one txt2kg server
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for `base_url`
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_type(request: RequestBuilder, db_type: Option<&str>) -> RequestBuilder {
        match db_type {
            Some(t) => request.query(&[("type", t)]),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        Ok(check(response).await?.json::<T>().await?)
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<Value> {
        self.send(self.http.get(self.url("/health"))).await
    }

    /// `POST /api/extract-triples`
    pub async fn extract(&self, text: &str, options: &ExtractOptions) -> Result<Extraction> {
        let mut body = serde_json::to_value(options)?;
        if let Value::Object(map) = &mut body {
            map.insert("text".to_string(), Value::from(text));
        }
        self.send(self.http.post(self.url("/api/extract-triples")).json(&body))
            .await
    }

    /// `POST /api/graph-db/triples`
    pub async fn store_triples(
        &self,
        triples: &[Triple],
        document_name: Option<&str>,
        db_type: Option<&str>,
    ) -> Result<WriteResult> {
        let request = self
            .http
            .post(self.url("/api/graph-db/triples"))
            .json(&json!({"triples": triples, "documentName": document_name}));
        self.send(Self::with_type(request, db_type)).await
    }

    /// `GET /api/graph-db`
    pub async fn graph(&self, db_type: Option<&str>) -> Result<GraphView> {
        let request = self.http.get(self.url("/api/graph-db"));
        self.send(Self::with_type(request, db_type)).await
    }

    /// `GET /api/graph-db/triples`
    pub async fn triples(&self, db_type: Option<&str>) -> Result<StoredTriples> {
        let request = self.http.get(self.url("/api/graph-db/triples"));
        self.send(Self::with_type(request, db_type)).await
    }

    /// `POST /api/graph-db/clear`
    pub async fn clear(&self, db_type: Option<&str>) -> Result<WriteResult> {
        let request = self.http.post(self.url("/api/graph-db/clear")).json(&json!({}));
        self.send(Self::with_type(request, db_type)).await
    }

    /// `GET /api/backend`
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> Result<Vec<SearchHit>> {
        let mut request = self
            .http
            .get(self.url("/api/backend"))
            .query(&[("query", query)]);
        if let Some(k) = top_k {
            request = request.query(&[("topK", k)]);
        }
        let response: SearchResponse = self.send(request).await?;
        Ok(response.triples)
    }

    /// `GET /api/settings`; with a key, a one-entry map
    pub async fn get_settings(&self, key: Option<&str>) -> Result<Map<String, Value>> {
        let mut request = self.http.get(self.url("/api/settings"));
        if let Some(key) = key {
            request = request.query(&[("key", key)]);
        }
        let body: Map<String, Value> = self.send(request).await?;
        match (key, body.get("settings")) {
            (None, Some(Value::Object(settings))) => Ok(settings.clone()),
            _ => Ok(body),
        }
    }

    /// `POST /api/settings`
    pub async fn set_settings(&self, settings: Map<String, Value>) -> Result<WriteResult> {
        self.send(
            self.http
                .post(self.url("/api/settings"))
                .json(&json!({ "settings": settings })),
        )
        .await
    }
}

/// Turn non-2xx responses into `CliError::Server` with the server's message
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or(text);
    Err(CliError::Server {
        status: status.as_u16(),
        message,
    })
}
