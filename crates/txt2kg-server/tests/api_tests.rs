//! HTTP API tests against mock collaborators

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for oneshot
use txt2kg_domain::GraphDbType;
use txt2kg_graph::GraphStoreRegistry;
use txt2kg_server::config::ServerConfig;
use txt2kg_server::handlers::{create_router, AppState};
use txt2kg_server::query_log::QueryLogger;
use txt2kg_vector::{InMemoryIndex, MockEmbedder, TripleIndex};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    router: Router,
    _dir: tempfile::TempDir,
}

impl TestApp {
    fn new(config: ServerConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let graph = Arc::new(GraphStoreRegistry::new(config.graph.clone()));
        let vectors = TripleIndex::new(
            Arc::new(MockEmbedder::new(32)),
            Arc::new(InMemoryIndex::new()),
        );
        let query_log = Arc::new(QueryLogger::new(dir.path().join("query-log.jsonl")));
        let state = AppState::with_parts(config, graph, vectors, query_log);
        Self {
            router: create_router(state),
            _dir: dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post_raw(uri, &body.to_string()).await
    }

    async fn post_raw(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

fn jena_config(server: &MockServer) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.graph.default_type = GraphDbType::Jena;
    config.graph.jena.endpoint = server.uri();
    config
}

async fn mount_jena_ask(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/txt2kg/sparql"))
        .and(body_string_contains("ASK"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"head": {}, "boolean": true})))
        .mount(server)
        .await;
}

fn ollama_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "qwen3:1.7b",
        "message": {"role": "assistant", "content": content},
        "done": true
    }))
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(ServerConfig::default());
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_extract_requires_text() {
    let app = TestApp::new(ServerConfig::default());
    let (status, body) = app.post("/api/extract-triples", json!({"text": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Text is required");
}

#[tokio::test]
async fn test_extract_with_ollama() {
    let ollama = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ollama_reply(
            "('Alice', 'works at', 'Acme')\n('Bob', 'knows', 'Alice')",
        ))
        .expect(1)
        .mount(&ollama)
        .await;

    let mut config = ServerConfig::default();
    config.llm.ollama_base_url = ollama.uri();
    let app = TestApp::new(config);

    let (status, body) = app
        .post(
            "/api/extract-triples",
            json!({"text": "Alice works at Acme. Bob knows Alice.", "ollamaModel": "qwen3:1.7b"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["chunkCount"], 1);
    assert_eq!(body["method"], "standard_pipeline");
    assert_eq!(body["llmProvider"], "ollama");
    assert_eq!(body["model"], "qwen3:1.7b");
    assert_eq!(body["customPromptUsed"], false);
}

#[tokio::test]
async fn test_extract_upstream_failure_is_500() {
    let ollama = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&ollama)
        .await;

    let mut config = ServerConfig::default();
    config.llm.ollama_base_url = ollama.uri();
    let app = TestApp::new(config);

    let (status, body) = app
        .post("/api/extract-triples", json!({"text": "Alice works at Acme."}))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to extract triples"));
}

#[tokio::test]
async fn test_batch_reports_item_failures() {
    let ollama = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains("poison"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .mount(&ollama)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ollama_reply("('Alice', 'works at', 'Acme')"))
        .mount(&ollama)
        .await;

    let mut config = ServerConfig::default();
    config.llm.ollama_base_url = ollama.uri();
    config.batch.max_attempts = 1;
    let app = TestApp::new(config);

    let (status, body) = app
        .post(
            "/api/extract-triples/batch",
            json!({"texts": ["Alice works at Acme.", "poison pill"], "concurrency": 2}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["results"][0]["index"], 0);
    assert_eq!(body["results"][0]["triples"].as_array().unwrap().len(), 1);
    assert!(body["results"][1]["error"].is_string());

    let (status, _) = app
        .post("/api/extract-triples/batch", json!({"texts": []}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ollama_connection_test() {
    let ollama = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "qwen3:1.7b"}, {"name": "llama3.1:8b"}]
        })))
        .mount(&ollama)
        .await;

    let mut config = ServerConfig::default();
    config.llm.ollama_base_url = ollama.uri();
    let app = TestApp::new(config);

    let (status, body) = app.get("/api/ollama").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], true);
    assert_eq!(body["models"], json!(["qwen3:1.7b", "llama3.1:8b"]));

    let (status, body) = app.get("/api/ollama?baseUrl=http://127.0.0.1:9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_settings_round_trip_and_db_type() {
    let app = TestApp::new(ServerConfig::default());

    let (status, body) = app.get("/api/settings?key=graph_db_type").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"graph_db_type": "arangodb"}));

    let (status, _) = app
        .post(
            "/api/settings",
            json!({"settings": {"graph_db_type": "neo4j", "theme": "dark"}}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/settings").await;
    assert_eq!(body["settings"]["graph_db_type"], "neo4j");
    assert_eq!(body["settings"]["theme"], "dark");

    let (_, body) = app.get("/api/settings?key=missing").await;
    assert_eq!(body, json!({"missing": null}));

    let (status, body) = app.post("/api/settings", json!({"settings": "dark"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Settings object is required");
}

#[tokio::test]
async fn test_query_log_validation_and_listing() {
    let app = TestApp::new(ServerConfig::default());

    let (status, body) = app
        .post("/api/query-log", json!({"queryMode": "traditional", "metrics": {}}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: query");

    let (status, body) = app
        .post("/api/query-log", json!({"query": "who is alice", "metrics": {}}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: queryMode");

    let (status, body) = app
        .post("/api/query-log", json!({"query": "who is alice", "queryMode": "pure-rag"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: metrics");

    for query in ["who is alice", "where does bob work"] {
        let (status, _) = app
            .post(
                "/api/query-log",
                json!({
                    "query": query,
                    "queryMode": "vector-search",
                    "metrics": {"executionTimeMs": 12.5, "resultCount": 3}
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.get("/api/query-log?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["query"], "where does bob work");
    assert_eq!(logs[0]["queryMode"], "vector-search");
    assert_eq!(logs[0]["metrics"]["resultCount"], 3);
}

#[tokio::test]
async fn test_store_triples_filters_invalid_entries() {
    let jena = MockServer::start().await;
    mount_jena_ask(&jena).await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/update"))
        .and(body_string_contains("INSERT DATA"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&jena)
        .await;

    let app = TestApp::new(jena_config(&jena));
    let (status, body) = app
        .post(
            "/api/graph-db/triples",
            json!({
                "documentName": "notes.txt",
                "triples": [
                    {"subject": "Alice", "predicate": "works at", "object": "Acme"},
                    {"subject": "Bob", "predicate": "", "object": "Acme"},
                    {"subject": "Bob", "predicate": "knows", "object": "Alice"}
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["documentName"], "notes.txt");
    assert_eq!(body["databaseType"], "jena");

    let (status, body) = app.post("/api/graph-db/triples", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Triples are required");
}

#[tokio::test]
async fn test_graph_view_enrichment() {
    let jena = MockServer::start().await;
    mount_jena_ask(&jena).await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/sparql"))
        .and(body_string_contains("?entity ?label"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "head": {"vars": ["entity", "label"]},
            "results": {"bindings": [
                {"entity": {"type": "uri", "value": "http://example.org/entity_alice"},
                 "label": {"type": "literal", "value": "alice"}},
                {"entity": {"type": "uri", "value": "http://example.org/entity_acme"},
                 "label": {"type": "literal", "value": "acme"}}
            ]}
        })))
        .mount(&jena)
        .await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/sparql"))
        .and(body_string_contains("?subject ?predicate ?object"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "head": {"vars": ["subject", "predicate", "object"]},
            "results": {"bindings": [
                {"subject": {"type": "uri", "value": "http://example.org/entity_alice"},
                 "predicate": {"type": "uri", "value": "http://example.org/works_at"},
                 "object": {"type": "uri", "value": "http://example.org/entity_acme"}}
            ]}
        })))
        .mount(&jena)
        .await;

    let app = TestApp::new(jena_config(&jena));

    let (status, body) = app.get("/api/graph-db").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["databaseType"], "jena");
    assert_eq!(body["connectionUrl"], jena.uri());
    let nodes = body["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0]["val"], 1);
    assert!(nodes[0]["label"].is_string());
    assert!(nodes[0]["color"].is_string());
    assert_eq!(body["links"][0]["label"], "works at");

    let (status, body) = app.get("/api/graph-db/triples").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["triples"][0]["subject"], "alice");
}

#[tokio::test]
async fn test_unknown_db_type_is_rejected() {
    let app = TestApp::new(ServerConfig::default());
    let (status, body) = app.get("/api/graph-db?type=oracle").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unsupported graph database type: oracle");
}

#[tokio::test]
async fn test_import_and_clear() {
    let jena = MockServer::start().await;
    mount_jena_ask(&jena).await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/update"))
        .and(body_string_contains("INSERT DATA"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&jena)
        .await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/update"))
        .and(body_string_contains("CLEAR ALL"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&jena)
        .await;

    let app = TestApp::new(jena_config(&jena));

    let (status, body) = app
        .post(
            "/api/graph-db",
            json!({"triples": [
                {"subject": "Alice", "predicate": "knows", "object": "Bob"},
                {"subject": "Alice", "predicate": " ", "object": "Carol"}
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully imported 1 triples into jena");
    assert_eq!(body["count"], 1);

    let (status, body) = app.post("/api/graph-db", json!({"data": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request: triples array is required");

    let (status, body) = app.post("/api/graph-db/clear", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully cleared all data from jena database");
}

#[tokio::test]
async fn test_backend_store_then_query() {
    let jena = MockServer::start().await;
    mount_jena_ask(&jena).await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/update"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&jena)
        .await;

    let app = TestApp::new(jena_config(&jena));

    let (status, body) = app.post("/api/backend", json!({"triples": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Triples are required and must be a non-empty array");

    let (status, body) = app
        .post(
            "/api/backend",
            json!({"triples": [
                {"subject": "Alice", "predicate": "works at", "object": "Acme"},
                {"subject": "Bob", "predicate": "knows", "object": "Alice"}
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stored"], 2);
    assert_eq!(body["indexed"], 2);
    assert_eq!(body["graphDbType"], "jena");

    let (status, body) = app.get("/api/backend?query=alice%20works&topK=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["query"], "alice works");
    assert!(body["triples"][0]["score"].is_number());

    let (status, body) = app.get("/api/backend").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Query parameter is required");
}

#[tokio::test]
async fn test_remote_webgpu_passthrough() {
    let gpu = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"gpu": "available"})))
        .mount(&gpu)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/cluster"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&gpu)
        .await;

    let mut config = ServerConfig::default();
    config.remote_webgpu_url = gpu.uri();
    let app = TestApp::new(config);

    let (status, body) = app.get("/api/remote-webgpu/api/status?verbose=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"gpu": "available"}));

    let (status, body) = app
        .post("/api/remote-webgpu/api/cluster", json!({"nodes": []}))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to communicate with remote WebGPU service");
    assert!(body["details"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_batch_blank_text_is_not_retried() {
    let ollama = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ollama_reply("('Alice', 'works at', 'Acme')"))
        .expect(1)
        .mount(&ollama)
        .await;

    let mut config = ServerConfig::default();
    config.llm.ollama_base_url = ollama.uri();
    config.batch.max_attempts = 3;
    let app = TestApp::new(config);

    let (status, body) = app
        .post(
            "/api/extract-triples/batch",
            json!({"texts": ["Alice works at Acme.", "   "]}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"], 1);
    assert_eq!(body["results"][0]["attempts"], 1);
    assert_eq!(body["results"][1]["attempts"], 1);
    assert_eq!(body["results"][1]["error"], "Text is required");
}

#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let app = TestApp::new(ServerConfig::default());

    let (status, body) = app.post("/api/extract-triples", json!({"text": 5})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Text is required");

    let (status, body) = app.post("/api/graph-db", json!({"triples": "oops"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app
        .post(
            "/api/query-log",
            json!({"query": 1, "queryMode": "traditional", "metrics": {}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app.post_raw("/api/settings", "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));

    let (status, body) = app
        .post("/api/extract-triples/batch", json!({"texts": "Alice"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_ollama_single_shot_extraction() {
    let ollama = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains("mistral:7b"))
        .respond_with(ollama_reply(
            r#"[{"subject": "Alice", "predicate": "works at", "object": "Acme"}]"#,
        ))
        .expect(1)
        .mount(&ollama)
        .await;

    let mut config = ServerConfig::default();
    config.llm.ollama_base_url = ollama.uri();
    config.extractor.chunk_size = 16;
    let app = TestApp::new(config);

    let text = "Alice works at Acme. She has been there for many years.";
    let (status, body) = app
        .post(
            "/api/ollama",
            json!({"text": text, "model": "mistral:7b", "temperature": 0.2, "maxTokens": 512}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 1);
    assert_eq!(body["method"], "ollama");
    assert_eq!(body["model"], "mistral:7b");
    let triple = &body["triples"][0];
    assert_eq!(triple["subject"], "alice");
    assert_eq!(triple["confidence"], 0.8);
    assert_eq!(triple["metadata"]["extractionMethod"], "ollama");
    assert_eq!(triple["metadata"]["source"], text);

    let (status, body) = app.post("/api/ollama", json!({"text": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Text is required");
}
