//! ApiClient against a mocked txt2kg server.

use serde_json::{json, Map, Value};
use txt2kg_cli::client::ExtractOptions;
use txt2kg_cli::{ApiClient, CliError};
use txt2kg_domain::Triple;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&server.uri());
    (server, client)
}

#[tokio::test]
async fn test_health() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    assert_eq!(client.health().await.unwrap(), json!({"status": "ok"}));
}

#[tokio::test]
async fn test_extract_sends_provider_fields() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/extract-triples"))
        .and(body_json(json!({
            "text": "Marie Curie discovered polonium.",
            "llmProvider": "nvidia",
            "nvidiaModel": "meta/llama-3.1-70b-instruct",
            "chunkSize": 1000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "triples": [{"subject": "marie curie", "predicate": "discovered", "object": "polonium"}],
            "count": 1,
            "chunkCount": 1,
            "method": "standard_pipeline",
            "llmProvider": "nvidia",
            "model": "meta/llama-3.1-70b-instruct",
            "customPromptUsed": false,
            "processingTimeMs": 812
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = ExtractOptions {
        llm_provider: Some("nvidia".to_string()),
        chunk_size: Some(1000),
        ..Default::default()
    }
    .with_model(Some("meta/llama-3.1-70b-instruct".to_string()));

    let extraction = client
        .extract("Marie Curie discovered polonium.", &options)
        .await
        .unwrap();
    assert_eq!(
        extraction.triples,
        vec![Triple::new("marie curie", "discovered", "polonium")]
    );
    assert_eq!(extraction.chunk_count, 1);
    assert_eq!(extraction.llm_provider, "nvidia");
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/extract-triples"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Text is required"})))
        .mount(&server)
        .await;

    let err = client
        .extract(" ", &ExtractOptions::default())
        .await
        .unwrap_err();
    match err {
        CliError::Server { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Text is required");
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/graph-db/triples"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client.triples(None).await.unwrap_err();
    assert!(matches!(
        err,
        CliError::Server { status: 502, ref message } if message == "bad gateway"
    ));
}

#[tokio::test]
async fn test_unreachable_server_is_connection_error() {
    let client = ApiClient::new("http://127.0.0.1:1");
    assert!(matches!(client.health().await, Err(CliError::Connection(_))));
}

#[tokio::test]
async fn test_store_triples_with_type_and_document() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/graph-db/triples"))
        .and(query_param("type", "jena"))
        .and(body_partial_json(json!({
            "documentName": "curie.txt",
            "triples": [{"subject": "a", "predicate": "knows", "object": "b"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Triples stored successfully in jena",
            "count": 1,
            "documentName": "curie.txt",
            "databaseType": "jena"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client
        .store_triples(&[Triple::new("a", "knows", "b")], Some("curie.txt"), Some("jena"))
        .await
        .unwrap();
    assert_eq!(result.message, "Triples stored successfully in jena");
    assert_eq!(result.count, Some(1));
}

#[tokio::test]
async fn test_graph_view() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/graph-db"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [
                {"id": "1", "labels": ["Entity"], "name": "alice", "label": "Entity", "val": 1, "color": "#ff6b6b"},
                {"id": "2", "labels": ["Entity"], "name": "acme", "label": "Entity", "val": 1, "color": "#ff6b6b"}
            ],
            "links": [{"id": "r1", "source": "1", "target": "2", "type": "WORKS_AT", "label": "works at"}],
            "connectionUrl": "bolt://localhost:7687",
            "databaseType": "neo4j"
        })))
        .mount(&server)
        .await;

    let graph = client.graph(None).await.unwrap();
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.links[0].label, "works at");
    assert_eq!(graph.database_type, "neo4j");
}

#[tokio::test]
async fn test_clear() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/graph-db/clear"))
        .and(query_param("type", "arangodb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Successfully cleared all data from arangodb database"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.clear(Some("arangodb")).await.unwrap();
    assert_eq!(result.message, "Successfully cleared all data from arangodb database");
    assert_eq!(result.count, None);
}

#[tokio::test]
async fn test_search_passes_top_k() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/backend"))
        .and(query_param("query", "who discovered polonium"))
        .and(query_param("topK", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "who discovered polonium",
            "triples": [
                {"subject": "marie curie", "predicate": "discovered", "object": "polonium", "score": 0.91}
            ],
            "count": 1,
            "topK": 2,
            "graphDbType": "arangodb"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = client.search("who discovered polonium", Some(2)).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].object, "polonium");
    assert!((hits[0].score - 0.91).abs() < 1e-6);
}

#[tokio::test]
async fn test_settings_get_and_set() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/settings"))
        .and(query_param("key", "graph_db_type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"graph_db_type": "jena"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "settings": {"graph_db_type": "arangodb", "theme": "dark"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/settings"))
        .and(body_json(json!({"settings": {"graph_db_type": "neo4j"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Settings updated successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let one = client.get_settings(Some("graph_db_type")).await.unwrap();
    assert_eq!(one.get("graph_db_type"), Some(&json!("jena")));

    let all = client.get_settings(None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all.get("theme"), Some(&json!("dark")));

    let mut update = Map::new();
    update.insert("graph_db_type".to_string(), Value::from("neo4j"));
    let result = client.set_settings(update).await.unwrap();
    assert_eq!(result.message, "Settings updated successfully");
}
