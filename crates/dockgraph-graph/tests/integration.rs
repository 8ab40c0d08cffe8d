//! Integration tests for dockgraph-graph against a live Neo4j instance.
//!
//! These tests wipe the target database; point them at a scratch instance.
//! Run with: cargo test --package dockgraph-graph --test integration -- --ignored
//!
//! Skipped automatically if Neo4j is not available.

use dockgraph_core::{Container, Entity, EntityKind, Network};
use dockgraph_graph::{GraphClient, GraphConfig, GraphStore, Mutation, SchemaCatalog};
use neo4rs::{Graph, Row};

async fn connect_or_skip() -> Option<GraphClient> {
    let config = GraphConfig::default();
    match GraphClient::connect(&config).await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test (Neo4j not available): {e}");
            None
        }
    }
}

/// A second, plain connection for reading back what the client wrote.
async fn reader() -> Graph {
    let config = GraphConfig::default();
    Graph::new(&config.uri, &config.user, &config.password)
        .await
        .unwrap()
}

async fn first_row(q: neo4rs::Query) -> Option<Row> {
    let graph = reader().await;
    let mut stream = graph.execute(q).await.unwrap();
    stream.next().await.unwrap()
}

async fn count(label: &str) -> i64 {
    let q = neo4rs::query(&format!("MATCH (n:{label}) RETURN count(n) AS cnt"));
    match first_row(q).await {
        Some(row) => row.get::<i64>("cnt").unwrap_or(0),
        None => 0,
    }
}

async fn index_names(client: &GraphClient) -> Vec<String> {
    let q = neo4rs::query("SHOW INDEXES YIELD name RETURN name ORDER BY name");
    client.names(q, "name").await.unwrap()
}

fn container(id: &str, name: &str, image: &str) -> Entity {
    Entity::from(Container {
        id: id.to_string(),
        name: name.to_string(),
        image: image.to_string(),
    })
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_upsert_container_is_idempotent() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    client.drop_all().await.unwrap();

    let schema = SchemaCatalog::default();
    client
        .alter_schema(schema.get(EntityKind::Container).unwrap())
        .await
        .unwrap();

    let m = Mutation::from_entity(&container("abcdef123456", "web1", "nginx:latest")).unwrap();
    client.mutate(&m).await.unwrap();
    client.mutate(&m).await.unwrap();

    assert_eq!(count("Container").await, 1);
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_upsert_overwrites_previous_record() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    client.drop_all().await.unwrap();

    let first = Mutation::from_entity(&container("0123456789ab", "api", "api:1")).unwrap();
    client.mutate(&first).await.unwrap();

    // Re-created without an image: the stale property must not survive.
    let second = Mutation::from_entity(&container("0123456789ab", "api", "")).unwrap();
    client.mutate(&second).await.unwrap();

    let q = neo4rs::query("MATCH (n:Container {id: $id}) RETURN n.image AS image")
        .param("id", "0123456789ab");
    let row = first_row(q).await.unwrap();
    assert!(row.get::<String>("image").is_err());
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_schema_twice_matches_schema_once() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    client.drop_all().await.unwrap();

    let schema = SchemaCatalog::default();
    let def = schema.get(EntityKind::Network).unwrap();

    client.alter_schema(def).await.unwrap();
    let once = index_names(&client).await;

    client.alter_schema(def).await.unwrap();
    let twice = index_names(&client).await;

    assert_eq!(once, twice);
    assert!(once.iter().any(|n| n == "network_driver_text"));
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_drop_all_clears_nodes_and_schema() {
    let Some(client) = connect_or_skip().await else {
        return;
    };

    let schema = SchemaCatalog::default();
    client
        .alter_schema(schema.get(EntityKind::Network).unwrap())
        .await
        .unwrap();
    let net = Entity::from(Network {
        id: "7f3e9a".to_string(),
        name: "backend".to_string(),
        driver: "bridge".to_string(),
        scope: "local".to_string(),
    });
    client.mutate(&Mutation::from_entity(&net).unwrap()).await.unwrap();

    client.drop_all().await.unwrap();

    assert_eq!(count("Network").await, 0);
    assert!(!index_names(&client)
        .await
        .iter()
        .any(|n| n.starts_with("network_")));
}
