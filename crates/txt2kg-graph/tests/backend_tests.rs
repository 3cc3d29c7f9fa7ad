//! Backend tests against mock HTTP servers

use serde_json::json;
use txt2kg_domain::{GraphDbType, Triple};
use txt2kg_graph::{
    ArangoConfig, ArangoStore, ConnectionOverrides, ConnectionParams, GraphDbConfig, GraphDbError,
    GraphStore, GraphStoreRegistry, JenaConfig, JenaStore, Neo4jConfig, Neo4jStore,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn triples(n: usize) -> Vec<Triple> {
    (0..n)
        .map(|i| Triple::new(format!("entity {}", i), "related to", format!("entity {}", i + 1)))
        .collect()
}

fn jena_params(server: &MockServer) -> ConnectionParams {
    ConnectionParams::Jena(JenaConfig {
        endpoint: server.uri(),
        ..Default::default()
    })
}

async fn mount_jena_ask(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/txt2kg/sparql"))
        .and(body_string_contains("ASK"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"head": {}, "boolean": true})))
        .mount(server)
        .await;
}

async fn connected_jena(server: &MockServer) -> JenaStore {
    mount_jena_ask(server).await;
    let store = JenaStore::new();
    store.initialize(jena_params(server)).await.unwrap();
    store
}

#[tokio::test]
async fn test_jena_import_250_triples_uses_three_updates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/update"))
        .and(body_string_contains("INSERT DATA"))
        .respond_with(ResponseTemplate::new(204))
        .expect(3)
        .mount(&server)
        .await;

    let store = connected_jena(&server).await;
    let count = store.import_triples(&triples(250)).await.unwrap();
    assert_eq!(count, 250);
}

#[tokio::test]
async fn test_jena_failed_batch_aborts_import() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/update"))
        .respond_with(ResponseTemplate::new(500).set_body_string("dataset locked"))
        .expect(1)
        .mount(&server)
        .await;

    let store = connected_jena(&server).await;
    let result = store.import_triples(&triples(150)).await;
    match result {
        Err(GraphDbError::Backend { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("dataset locked"));
        }
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_jena_empty_import_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/update"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let store = connected_jena(&server).await;
    assert_eq!(store.import_triples(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_jena_invalid_triples_not_counted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/update"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = connected_jena(&server).await;
    let input = vec![
        Triple::new("alice", "knows", "bob"),
        Triple::new("alice", "", "bob"),
    ];
    assert_eq!(store.import_triples(&input).await.unwrap(), 1);
}

#[tokio::test]
async fn test_jena_graph_data() {
    let server = MockServer::start().await;
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
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/sparql"))
        .and(body_string_contains("?subject ?predicate ?object"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "head": {"vars": ["subject", "predicate", "object"]},
            "results": {"bindings": [
                {"subject": {"type": "uri", "value": "http://example.org/entity_alice"},
                 "predicate": {"type": "uri", "value": "http://example.org/works_at"},
                 "object": {"type": "uri", "value": "http://example.org/entity_acme"}},
                {"subject": {"type": "uri", "value": "http://example.org/entity_alice"},
                 "predicate": {"type": "uri", "value": "http://example.org/knows"},
                 "object": {"type": "uri", "value": "http://example.org/entity_ghost"}}
            ]}
        })))
        .mount(&server)
        .await;

    let store = connected_jena(&server).await;
    let graph = store.get_graph_data().await.unwrap();

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.nodes[0].id, "node_0");
    assert_eq!(graph.nodes[0].name.as_deref(), Some("alice"));
    assert_eq!(graph.relationships.len(), 1);
    assert_eq!(graph.relationships[0].rel_type, "works at");

    let keys: Vec<String> = graph.to_triples().iter().map(|t| t.key()).collect();
    assert_eq!(keys, vec!["alice|works at|acme"]);
}

#[tokio::test]
async fn test_jena_close_returns_to_uninitialized() {
    let server = MockServer::start().await;
    let store = connected_jena(&server).await;
    assert!(store.is_initialized().await);
    assert!(store.driver_info().await.connected);

    store.close().await;
    assert!(!store.is_initialized().await);
    assert!(matches!(
        store.get_graph_data().await,
        Err(GraphDbError::NotInitialized(GraphDbType::Jena))
    ));
}

#[tokio::test]
async fn test_failed_initialize_publishes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/sparql"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = JenaStore::new();
    assert!(store.initialize(jena_params(&server)).await.is_err());
    assert!(!store.is_initialized().await);
}

#[tokio::test]
async fn test_neo4j_import_and_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/db/neo4j/tx/commit"))
        .and(body_string_contains("RETURN 1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [], "errors": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/db/neo4j/tx/commit"))
        .and(body_string_contains("WORKS_AT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [], "errors": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/db/neo4j/tx/commit"))
        .and(body_string_contains("DETACH DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Security.Forbidden", "message": "read only"}]
        })))
        .mount(&server)
        .await;

    let store = Neo4jStore::new();
    store
        .initialize(ConnectionParams::Neo4j(Neo4jConfig {
            uri: server.uri(),
            password: Some("secret".to_string()),
            ..Default::default()
        }))
        .await
        .unwrap();

    let input = vec![
        Triple::new("alice", "works at", "acme"),
        Triple::new("bob", "works at", "acme"),
        Triple::new("", "knows", "bob"),
    ];
    assert_eq!(store.import_triples(&input).await.unwrap(), 2);

    match store.clear_database().await {
        Err(GraphDbError::Backend { message, .. }) => assert!(message.contains("read only")),
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_neo4j_graph_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/db/neo4j/tx/commit"))
        .and(body_string_contains("RETURN 1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [], "errors": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/db/neo4j/tx/commit"))
        .and(body_string_contains("MATCH (n:Entity)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"columns": ["id", "labels", "name"], "data": [
                    {"row": ["4:a:0", ["Entity"], "alice"]},
                    {"row": ["4:a:1", ["Entity"], "acme"]}
                ]},
                {"columns": ["id", "source", "target", "type"], "data": [
                    {"row": ["5:a:0", "4:a:0", "4:a:1", "works at"]}
                ]}
            ],
            "errors": []
        })))
        .mount(&server)
        .await;

    let store = Neo4jStore::new();
    store
        .initialize(ConnectionParams::Neo4j(Neo4jConfig {
            uri: server.uri(),
            ..Default::default()
        }))
        .await
        .unwrap();

    let graph = store.get_graph_data().await.unwrap();
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.nodes[0].labels, vec!["Entity"]);
    let keys: Vec<String> = graph.to_triples().iter().map(|t| t.key()).collect();
    assert_eq!(keys, vec!["alice|works at|acme"]);
}

async fn mount_arango_schema(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/_db/_system/_api/database"))
        .respond_with(ResponseTemplate::new(409))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_db/txt2kg/_api/collection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "entities"})))
        .expect(2)
        .mount(server)
        .await;
}

async fn connected_arango(server: &MockServer) -> ArangoStore {
    mount_arango_schema(server).await;
    let store = ArangoStore::new();
    store
        .initialize(ConnectionParams::ArangoDb(ArangoConfig {
            url: server.uri(),
            ..Default::default()
        }))
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn test_arango_import_upserts_entities_then_edges() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_db/txt2kg/_api/cursor"))
        .and(body_string_contains("IN entities"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "result": [
                {"name": "alice", "id": "entities/1"},
                {"name": "acme", "id": "entities/2"}
            ],
            "hasMore": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_db/txt2kg/_api/cursor"))
        .and(body_string_contains("IN relationships"))
        .and(body_string_contains("entities/1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"result": [], "hasMore": false})))
        .expect(1)
        .mount(&server)
        .await;

    let store = connected_arango(&server).await;
    let count = store
        .import_triples(&[Triple::new("alice", "works at", "acme")])
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_arango_graph_data_follows_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_db/txt2kg/_api/cursor"))
        .and(body_string_contains("FOR d IN entities"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "result": [{"id": "entities/1", "name": "alice"}],
            "hasMore": true,
            "id": "42"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_db/txt2kg/_api/cursor/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"id": "entities/2", "name": "acme"}],
            "hasMore": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_db/txt2kg/_api/cursor"))
        .and(body_string_contains("FOR e IN relationships"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "result": [{"id": "relationships/1", "source": "entities/1", "target": "entities/2", "type": "works at"}],
            "hasMore": false
        })))
        .mount(&server)
        .await;

    let store = connected_arango(&server).await;
    let graph = store.get_graph_data().await.unwrap();
    assert_eq!(graph.nodes.len(), 2);
    let keys: Vec<String> = graph.to_triples().iter().map(|t| t.key()).collect();
    assert_eq!(keys, vec!["alice|works at|acme"]);
}

#[tokio::test]
async fn test_arango_clear_truncates_both_collections() {
    let server = MockServer::start().await;
    for collection in ["entities", "relationships"] {
        Mock::given(method("PUT"))
            .and(path(format!("/_db/txt2kg/_api/collection/{}/truncate", collection)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let store = connected_arango(&server).await;
    store.clear_database().await.unwrap();
}

#[tokio::test]
async fn test_registry_connect_initializes_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/sparql"))
        .and(body_string_contains("ASK"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"head": {}, "boolean": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = GraphDbConfig::default();
    config.jena.endpoint = server.uri();
    let registry = GraphStoreRegistry::new(config);

    let first = registry
        .connect(GraphDbType::Jena, &ConnectionOverrides::default())
        .await
        .unwrap();
    let second = registry
        .connect(GraphDbType::Jena, &ConnectionOverrides::default())
        .await
        .unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert!(first.is_initialized().await);

    registry.close_all().await;
    assert!(!second.is_initialized().await);
}

#[tokio::test]
async fn test_registry_overrides_do_not_redirect_other_stores() {
    let server = MockServer::start().await;
    for dataset in ["a", "b"] {
        Mock::given(method("POST"))
            .and(path(format!("/{}/sparql", dataset)))
            .and(body_string_contains("ASK"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"head": {}, "boolean": true})))
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/a/update"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/b/update"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = GraphDbConfig::default();
    config.jena.endpoint = server.uri();
    let registry = GraphStoreRegistry::new(config);
    let dataset = |name: &str| ConnectionOverrides {
        database: Some(name.to_string()),
        ..Default::default()
    };

    let store_a = registry.connect(GraphDbType::Jena, &dataset("a")).await.unwrap();
    let store_b = registry.connect(GraphDbType::Jena, &dataset("b")).await.unwrap();
    assert!(!std::sync::Arc::ptr_eq(&store_a, &store_b));

    store_a.import_triples(&triples(1)).await.unwrap();

    let again = registry.connect(GraphDbType::Jena, &dataset("a")).await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&store_a, &again));
    assert!(!registry.get(GraphDbType::Jena).is_initialized().await);

    registry.close_all().await;
    assert!(!store_a.is_initialized().await);
}

#[tokio::test]
async fn test_registry_slow_backend_does_not_block_others() {
    let jena = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/txt2kg/sparql"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"head": {}, "boolean": true}))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&jena)
        .await;
    let neo4j = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/db/neo4j/tx/commit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [], "errors": []})))
        .mount(&neo4j)
        .await;

    let mut config = GraphDbConfig::default();
    config.jena.endpoint = jena.uri();
    config.neo4j.uri = neo4j.uri();
    let registry = std::sync::Arc::new(GraphStoreRegistry::new(config));

    let slow = {
        let registry = registry.clone();
        tokio::spawn(async move {
            registry
                .connect(GraphDbType::Jena, &ConnectionOverrides::default())
                .await
                .map(|_| ())
        })
    };
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let started = std::time::Instant::now();
    registry
        .connect(GraphDbType::Neo4j, &ConnectionOverrides::default())
        .await
        .unwrap();
    assert!(started.elapsed() < std::time::Duration::from_secs(1));

    slow.await.unwrap().unwrap();
}
