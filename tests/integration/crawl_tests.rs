//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run real
//! coordinator/worker crawls against them end-to-end.

use driftnet::config::{CrawlConfig, HttpConfig};
use driftnet::control::{Coordinator, CoordinatorHandle};
use driftnet::crawler::{HttpTransport, Worker};
use driftnet::storage::{MockStore, SqliteStore, Store};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The server's `host:port`, as compared against the whitelist
fn host_port(server: &MockServer) -> String {
    let url = url::Url::parse(&server.uri()).expect("Failed to parse base URL");
    format!(
        "{}:{}",
        url.host_str().expect("Failed to extract host"),
        url.port().expect("Mock server has an explicit port")
    )
}

fn whitelisted(server: &MockServer) -> CrawlConfig {
    CrawlConfig {
        whitelisted_hosts: Some(vec![host_port(server)]),
        ..CrawlConfig::default()
    }
}

async fn mount_page(server: &MockServer, route: &str, content_type: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
        .mount(server)
        .await;
}

/// Seeds a coordinator, starts it and spawns `workers` HTTP workers
fn start_crawl<S: Store>(
    config: CrawlConfig,
    store: S,
    seed: String,
    workers: usize,
) -> CoordinatorHandle<S> {
    let transport = Arc::new(
        HttpTransport::new(&HttpConfig {
            timeout_secs: 5,
            ..HttpConfig::default()
        })
        .expect("Failed to build transport"),
    );

    let mut coordinator = Coordinator::new(config, store);
    coordinator.seed([seed]);
    let connections: Vec<_> = (0..workers).map(|_| coordinator.connect()).collect();
    let handle = coordinator.run().expect("Failed to start coordinator");

    for (id, connection) in connections.into_iter().enumerate() {
        let worker = Worker::new(id, connection, transport.clone(), Duration::from_millis(20));
        tokio::spawn(worker.run());
    }
    handle
}

/// Polls the database file until it holds `expected` pages
async fn wait_for_pages(db_path: &Path, expected: u64) {
    let poll = async {
        loop {
            let mut reader = SqliteStore::new(db_path);
            let count = match reader.connect() {
                Ok(()) => reader.count_pages().unwrap_or(0),
                Err(_) => 0,
            };
            let _ = reader.close();

            if count >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    };

    tokio::time::timeout(Duration::from_secs(10), poll)
        .await
        .unwrap_or_else(|_| panic!("Timed out waiting for {} stored pages", expected));
}

async fn finish<S: Store>(handle: CoordinatorHandle<S>) -> S {
    handle.stop();
    let (store, _) = tokio::time::timeout(Duration::from_secs(10), handle.await_completion())
        .await
        .expect("Crawl did not finish after stop")
        .expect("Coordinator task failed");
    store
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crawl_follows_links_and_stores_text() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        "text/html",
        r#"<html><head><title>Home</title></head><body>
            <p>Some text</p><a href="/page2">Page 2</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &server,
        "/page2",
        "text/html; charset=utf-8",
        "<html><body><h1>Second</h1></body></html>".to_string(),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");

    let handle = start_crawl(
        whitelisted(&server),
        SqliteStore::new(&db_path),
        format!("{}/", base),
        2,
    );
    wait_for_pages(&db_path, 2).await;
    let store = finish(handle).await;

    let home = store.get_page(&format!("{}/", base)).unwrap().unwrap();
    assert_eq!(home.text, vec!["Home", "Some text"]);
    assert_eq!(home.links, vec![format!("{}/page2", base)]);
    assert_eq!(home.depth, 0);
    assert_eq!(home.content_type, "text/html");
    assert_eq!(home.found_via, None);

    let page2 = store.get_page(&format!("{}/page2", base)).unwrap().unwrap();
    assert_eq!(page2.text, vec!["Second"]);
    assert_eq!(page2.depth, 1);
    assert_eq!(page2.found_via, Some(format!("{}/", base)));

    assert_eq!(store.count_pages().unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_whitelist_blocks_other_hosts() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>other</p>", "text/html"))
        .expect(0)
        .mount(&other)
        .await;

    mount_page(
        &server,
        "/",
        "text/html",
        format!(
            r#"<body><p>Home</p><a href="{}/elsewhere">Elsewhere</a><a href="/local">Local</a></body>"#,
            other.uri()
        ),
    )
    .await;
    mount_page(&server, "/local", "text/plain", "local notes".to_string()).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");

    let handle = start_crawl(
        whitelisted(&server),
        SqliteStore::new(&db_path),
        format!("{}/", server.uri()),
        2,
    );
    wait_for_pages(&db_path, 2).await;
    let store = finish(handle).await;

    let local = store
        .get_page(&format!("{}/local", server.uri()))
        .unwrap()
        .unwrap();
    assert_eq!(local.text, vec!["local notes"]);
    assert_eq!(local.content_type, "text/plain");

    other.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_max_depth_limits_crawl() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "text/html",
        r#"<body><p>Root</p><a href="/a">A</a></body>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/a",
        "text/html",
        r#"<body><p>A</p><a href="/b">B</a></body>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>B</p>", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");

    let config = CrawlConfig {
        max_depth: Some(1),
        ..whitelisted(&server)
    };
    let handle = start_crawl(
        config,
        SqliteStore::new(&db_path),
        format!("{}/", server.uri()),
        2,
    );
    wait_for_pages(&db_path, 2).await;
    // Give any stray job a chance to reach the server
    tokio::time::sleep(Duration::from_millis(100)).await;
    let store = finish(handle).await;

    assert_eq!(store.count_pages().unwrap(), 2);
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_pages_are_not_stored() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "text/html",
        r#"<body><p>Root</p>
            <a href="/asset">Asset</a>
            <a href="/missing">Missing</a>
            <a href="/page2">Page 2</a>
        </body>"#
            .to_string(),
    )
    .await;
    mount_page(&server, "/asset", "image/png", "\u{89}PNG".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(&server, "/page2", "text/html", "<p>Two</p>".to_string()).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");

    // One worker drains the frontier in order, so /asset and /missing are
    // handled before /page2 is stored
    let handle = start_crawl(
        whitelisted(&server),
        SqliteStore::new(&db_path),
        format!("{}/", server.uri()),
        1,
    );
    wait_for_pages(&db_path, 2).await;
    let store = finish(handle).await;

    assert_eq!(store.count_pages().unwrap(), 2);
    assert!(store
        .get_page(&format!("{}/asset", server.uri()))
        .unwrap()
        .is_none());
    assert!(store
        .get_page(&format!("{}/missing", server.uri()))
        .unwrap()
        .is_none());
    assert_eq!(
        store.count_by_content_type().unwrap(),
        vec![("text/html".to_string(), 2)]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mock_store_crawl() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "text/html",
        r#"<body><p>Root</p><a href="/next">Next</a></body>"#.to_string(),
    )
    .await;
    mount_page(&server, "/next", "text/html", "<p>Next</p>".to_string()).await;

    let handle = start_crawl(
        whitelisted(&server),
        MockStore::new(),
        format!("{}/", server.uri()),
        2,
    );

    let requests = async {
        loop {
            let received = server.received_requests().await.unwrap_or_default();
            if received.len() >= 2 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(10), requests)
        .await
        .expect("Timed out waiting for requests");

    let store = finish(handle).await;
    assert_eq!(store.inserted(), 2);
}

#[tokio::test]
async fn test_unreachable_store_fails_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::new(dir.path().join("no-such-dir").join("crawl.db"));

    let mut coordinator = Coordinator::new(whitelisted(&server), store);
    coordinator.seed([format!("{}/", server.uri())]);
    let _connection = coordinator.connect();

    assert!(coordinator.run().is_err());
    server.verify().await;
}
