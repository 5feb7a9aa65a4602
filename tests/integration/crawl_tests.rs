//! Integration tests for the crawler
//!
//! These tests use wiremock to create a mock analytics API and test
//! the full crawl cycle end-to-end against JSON stores in a temp directory.

use forward_graph::config::{ApiConfig, Config, CrawlerConfig, InputConfig, OutputConfig, RetryConfig};
use forward_graph::crawler::Coordinator;
use forward_graph::input::{load_seeds, SeedList};
use forward_graph::storage::{load_array, write_json_atomic, CheckpointStore, JsonCheckpointStore};
use forward_graph::{CrawlError, ForwardEdge, Progress};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server and temp directory
fn create_test_config(base_url: &str, dir: &TempDir) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            token: "test-token".to_string(),
            request_timeout_secs: 5,
            connect_timeout_secs: 5,
        },
        crawler: CrawlerConfig {
            page_size: 20,
            page_delay_ms: 0, // No pacing in tests
            detail_concurrency: 3,
            retry_skipped: false,
        },
        retry: RetryConfig {
            max_attempts: 2,
            base_delay_ms: 1,
            jitter_ms: 0,
        },
        input: InputConfig {
            seeds_path: PathBuf::from("seeds.csv"),
            column: "Target Channel".to_string(),
        },
        output: OutputConfig {
            directory: dir.path().to_path_buf(),
            ..OutputConfig::default()
        },
    }
}

fn ok(payload: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "response": payload}))
}

async fn mount_channel(server: &MockServer, username: &str) {
    Mock::given(method("GET"))
        .and(path("/channels/get"))
        .and(query_param("channelId", username))
        .respond_with(ok(json!({
            "username": username,
            "title": format!("Channel {}", username),
            "tgstat_restrictions": {"red_label": false}
        })))
        .mount(server)
        .await;
}

/// Mounts one page of forwards at offset 0 followed by an empty page
async fn mount_forwards(server: &MockServer, username: &str, page: Value) {
    Mock::given(method("GET"))
        .and(path("/channels/forwards"))
        .and(query_param("channelId", username))
        .and(query_param("offset", "0"))
        .respond_with(ok(page))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels/forwards"))
        .and(query_param("channelId", username))
        .and(query_param("offset", "20"))
        .respond_with(ok(json!({"items": [], "channels": []})))
        .mount(server)
        .await;
}

async fn mount_post(server: &MockServer, post_id: &str, views: i64) {
    Mock::given(method("GET"))
        .and(path("/posts/get"))
        .and(query_param("postId", post_id))
        .respond_with(ok(json!({"id": post_id.parse::<i64>().unwrap(), "views": views, "text": "body"})))
        .mount(server)
        .await;
}

fn single_forward(channel_id: i64, target: &str, post_id: i64, date: i64) -> Value {
    json!({
        "items": [{"channelId": channel_id, "sourcePostId": post_id, "postDate": date}],
        "channels": [{"id": channel_id, "username": target}]
    })
}

fn final_edges(config: &Config) -> Vec<ForwardEdge> {
    load_array(&config.output.edges_path(), "edges")
}

#[tokio::test]
async fn test_end_to_end_two_seeds() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir);

    mount_channel(&server, "alpha").await;
    mount_channel(&server, "beta").await;
    mount_forwards(&server, "alpha", single_forward(7, "gamma", 55, 1700000000)).await;
    Mock::given(method("GET"))
        .and(path("/channels/forwards"))
        .and(query_param("channelId", "beta"))
        .respond_with(ok(json!({"items": [], "channels": []})))
        .mount(&server)
        .await;
    mount_post(&server, "55", 120).await;

    let seeds = SeedList::from_values(["alpha", "beta"]);
    let coordinator = Coordinator::new(config.clone()).unwrap();
    let summary = coordinator.run(&seeds).await.unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.total_edges, 1);
    assert!(summary.skipped.is_empty());

    let edges = final_edges(&config);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source, "alpha");
    assert_eq!(edges[0].target, "gamma");
    assert_eq!(edges[0].post.views, Some(120));
    assert_eq!(edges[0].post.date, Some(1700000000));

    let items: Vec<Value> = load_array(&config.output.items_path(), "raw items");
    assert_eq!(items.len(), 1);

    assert!(!config.output.checkpoint_path().exists());
    assert!(!config.output.temp_edges_path().exists());
    assert!(!config.output.temp_items_path().exists());
}

#[tokio::test]
async fn test_skipped_channel_yields_nothing_but_advances() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir);

    Mock::given(method("GET"))
        .and(path("/channels/get"))
        .and(query_param("channelId", "ghost"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "error", "error": "not found"})),
        )
        .expect(2)
        .mount(&server)
        .await;
    mount_channel(&server, "alpha").await;
    mount_forwards(&server, "alpha", single_forward(7, "gamma", 55, 1)).await;
    mount_post(&server, "55", 1).await;

    let seeds = SeedList::from_values(["ghost", "alpha"]);
    let summary = Coordinator::new(config.clone())
        .unwrap()
        .run(&seeds)
        .await
        .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, vec!["ghost".to_string()]);
    let edges = final_edges(&config);
    assert_eq!(edges.len(), 1);
    assert!(edges.iter().all(|e| e.source != "ghost"));
}

#[tokio::test]
async fn test_duplicate_forwards_within_channel_are_dropped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir);

    mount_channel(&server, "alpha").await;
    mount_forwards(
        &server,
        "alpha",
        json!({
            "items": [
                {"channelId": 7, "sourcePostId": 55, "postDate": 100},
                {"channelId": 7, "sourcePostId": 56, "postDate": 100},
                {"channelId": 7, "sourcePostId": 57, "postDate": 101},
                {"channelId": 8, "sourcePostId": 58, "postDate": 100}
            ],
            "channels": [{"id": 7, "username": "gamma"}]
        }),
    )
    .await;
    mount_post(&server, "55", 1).await;
    mount_post(&server, "57", 2).await;

    let seeds = SeedList::from_values(["alpha"]);
    let summary = Coordinator::new(config.clone())
        .unwrap()
        .run(&seeds)
        .await
        .unwrap();
    assert_eq!(summary.raw_items, 4);

    let edges = final_edges(&config);
    let keys: Vec<_> = edges
        .iter()
        .map(|e| (e.source.clone(), e.target.clone(), e.post.date))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("alpha".to_string(), "gamma".to_string(), Some(100)),
            ("alpha".to_string(), "gamma".to_string(), Some(101)),
        ]
    );
}

#[tokio::test]
async fn test_resume_after_interruption_does_not_duplicate() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir);
    let seeds = SeedList::from_values(["alpha", "beta"]);

    // First run: alpha completes, then the process dies while beta's
    // records are flushed but before its checkpoint is written.
    let alpha_edge: ForwardEdge = serde_json::from_value(json!({
        "source": "alpha",
        "source_info": {},
        "target": "gamma",
        "target_info": {},
        "post": {"id": 55, "date": 100}
    }))
    .unwrap();
    let beta_edge = ForwardEdge {
        source: "beta".to_string(),
        ..alpha_edge.clone()
    };
    write_json_atomic(
        &config.output.temp_edges_path(),
        &[alpha_edge.clone(), beta_edge],
    )
    .unwrap();
    write_json_atomic(
        &config.output.temp_items_path(),
        &[json!({"from": "alpha"}), json!({"from": "beta"})],
    )
    .unwrap();

    let mut progress = Progress::new(2, Some(seeds.fingerprint.clone()));
    progress.record_flushed(1, 1);
    progress.advance(1, "alpha");
    JsonCheckpointStore::new(config.output.checkpoint_path())
        .save(&progress)
        .unwrap();

    // Second run resumes at beta; alpha must not be requested again.
    Mock::given(method("GET"))
        .and(path("/channels/get"))
        .and(query_param("channelId", "alpha"))
        .respond_with(ok(json!({"username": "alpha"})))
        .expect(0)
        .mount(&server)
        .await;
    mount_channel(&server, "beta").await;
    mount_forwards(&server, "beta", single_forward(7, "gamma", 55, 100)).await;
    mount_post(&server, "55", 9).await;

    let summary = Coordinator::new(config.clone())
        .unwrap()
        .run(&seeds)
        .await
        .unwrap();
    assert_eq!(summary.channels_this_run, 1);

    let edges = final_edges(&config);
    let sources: Vec<_> = edges.iter().map(|e| e.source.as_str()).collect();
    assert_eq!(sources, vec!["alpha", "beta"]);

    let items: Vec<Value> = load_array(&config.output.items_path(), "raw items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], json!({"from": "alpha"}));
}

#[tokio::test]
async fn test_changed_seed_list_is_rejected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir);

    let old_seeds = SeedList::from_values(["alpha", "beta"]);
    let mut progress = Progress::new(2, Some(old_seeds.fingerprint.clone()));
    progress.advance(1, "alpha");
    let checkpoint = JsonCheckpointStore::new(config.output.checkpoint_path());
    checkpoint.save(&progress).unwrap();

    let new_seeds = SeedList::from_values(["beta", "alpha"]);
    let coordinator = Coordinator::new(config.clone()).unwrap();
    let result = coordinator.run(&new_seeds).await;

    assert!(matches!(result, Err(CrawlError::SeedListChanged { .. })));
    assert_eq!(checkpoint.load(), Some(progress));
}

#[tokio::test]
async fn test_fresh_discards_previous_progress() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir);

    let seeds = SeedList::from_values(["alpha"]);
    let mut progress = Progress::new(1, Some("stale".to_string()));
    progress.advance(1, "alpha");
    JsonCheckpointStore::new(config.output.checkpoint_path())
        .save(&progress)
        .unwrap();
    write_json_atomic(&config.output.temp_items_path(), &[json!({"old": true})]).unwrap();

    mount_channel(&server, "alpha").await;
    mount_forwards(&server, "alpha", json!({"items": [], "channels": []})).await;

    let coordinator = Coordinator::new(config.clone()).unwrap();
    coordinator.prepare_fresh().unwrap();
    let summary = coordinator.run(&seeds).await.unwrap();

    assert_eq!(summary.channels_this_run, 1);
    assert_eq!(summary.raw_items, 0);
    let items: Vec<Value> = load_array(&config.output.items_path(), "raw items");
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_retry_skipped_recovers_channel() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), &dir);
    config.crawler.retry_skipped = true;

    let seeds = SeedList::from_values(["alpha", "beta"]);
    let mut progress = Progress::new(2, Some(seeds.fingerprint.clone()));
    progress.record_skip("alpha");
    progress.record_flushed(0, 0);
    progress.advance(1, "alpha");
    JsonCheckpointStore::new(config.output.checkpoint_path())
        .save(&progress)
        .unwrap();

    mount_channel(&server, "alpha").await;
    mount_channel(&server, "beta").await;
    mount_forwards(&server, "alpha", single_forward(7, "gamma", 55, 1)).await;
    mount_forwards(&server, "beta", json!({"items": [], "channels": []})).await;
    mount_post(&server, "55", 3).await;

    let summary = Coordinator::new(config.clone())
        .unwrap()
        .run(&seeds)
        .await
        .unwrap();

    assert!(summary.skipped.is_empty());
    assert_eq!(summary.channels_this_run, 2);
    let edges = final_edges(&config);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source, "alpha");
}

#[tokio::test]
async fn test_source_uses_normalized_seed_username() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir);

    let seeds_path = dir.path().join("seeds.csv");
    std::fs::write(&seeds_path, "Target Channel\n  @alpha \n").unwrap();
    let seeds = load_seeds(&seeds_path, &config.input.column).unwrap();
    assert_eq!(seeds.channels, vec!["alpha".to_string()]);

    mount_channel(&server, "alpha").await;
    mount_forwards(&server, "alpha", single_forward(7, "gamma", 55, 1700000000)).await;
    mount_post(&server, "55", 40).await;

    Coordinator::new(config.clone())
        .unwrap()
        .run(&seeds)
        .await
        .unwrap();

    let edges = final_edges(&config);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source, "alpha");
}
