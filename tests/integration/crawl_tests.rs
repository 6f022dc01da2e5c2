//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the upstream site and its media
//! host, and drive full account crawls end-to-end over HTTP.

use ig_harvest::config::{Config, CrawlerConfig, OutputConfig};
use ig_harvest::crawler::{Coordinator, Sequencer};
use ig_harvest::output::AccountOutcome;
use ig_harvest::state::Account;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY_ID: &str = "0123456789abcdef0123456789abcdef";

/// Creates a test configuration rooted at `tmp` and pointed at `base_url`
fn create_test_config(base_url: &str, tmp: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            base_url: base_url.to_string(),
            max_concurrent_downloads: 2,
            request_timeout_secs: 5,
            ..CrawlerConfig::default()
        },
        output: OutputConfig {
            image_dir: tmp.join("instagram"),
            log_dir: tmp.join("log"),
        },
        ..Config::default()
    }
}

/// Landing page nodes carry `date`; API nodes carry `taken_at_timestamp`
fn node(url: &str, is_video: bool) -> Value {
    json!({"node": {
        "display_url": url,
        "thumbnail_src": url,
        "is_video": is_video,
        "date": 1522000000,
        "dimensions": {"width": 1080, "height": 1080}
    }})
}

fn api_node(url: &str) -> Value {
    json!({"node": {
        "display_url": url,
        "thumbnail_src": url,
        "is_video": false,
        "taken_at_timestamp": 1522000000,
        "dimensions": {"width": 1080, "height": 1080}
    }})
}

fn landing_page(account: &str, edges: Vec<Value>, cursor: Option<&str>) -> String {
    let shared = json!({
        "rhx_gis": "",
        "entry_data": {"ProfilePage": [{"graphql": {"user": {
            "id": "123",
            "username": account,
            "edge_owner_to_timeline_media": {
                "count": edges.len(),
                "page_info": {"end_cursor": cursor, "has_next_page": cursor.is_some()},
                "edges": edges
            }
        }}}]}
    });
    format!(
        r#"<!DOCTYPE html><html><head>
        <link rel="preload" href="/static/bundles/ProfilePageContainer.js" as="script">
        </head><body>
        <script type="text/javascript">window._sharedData = {};</script>
        <script>console.log("later");</script>
        </body></html>"#,
        shared
    )
}

fn api_page(edges: Vec<Value>, cursor: Option<&str>) -> String {
    json!({
        "data": {"user": {"edge_owner_to_timeline_media": {
            "page_info": {"end_cursor": cursor, "has_next_page": cursor.is_some()},
            "edges": edges
        }}},
        "status": "ok"
    })
    .to_string()
}

async fn mount_script_bundle(server: &MockServer) {
    let bundle = format!(
        r#"e.exports={{queryId:"{}"}};t.exports={{queryId:"{}"}};"#,
        "9".repeat(32),
        QUERY_ID
    );
    Mock::given(method("GET"))
        .and(path("/static/bundles/ProfilePageContainer.js"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(bundle, "application/javascript"))
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/media/{}", name)))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(format!("jpeg:{}", name), "image/jpeg"),
        )
        .mount(server)
        .await;
}

/// Mounts alice's two-page feed: a, video, b on the landing page, c on the API page
async fn mount_alice(server: &MockServer) {
    let base = server.uri();
    let landing = landing_page(
        "alice",
        vec![
            node(&format!("{}/media/a.jpg", base), false),
            node(&format!("{}/media/clip.jpg", base), true),
            node(&format!("{}/media/b.jpg", base), false),
        ],
        Some("AB"),
    );

    Mock::given(method("GET"))
        .and(path("/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(landing, "text/html"))
        .mount(server)
        .await;

    mount_script_bundle(server).await;

    Mock::given(method("GET"))
        .and(path("/graphql/query/"))
        .and(query_param("query_hash", QUERY_ID))
        .and(query_param("variables", r#"{"id":"123","first":50,"after":"AB"}"#))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .and(header("Referrer", format!("{}/alice", base).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            api_page(vec![api_node(&format!("{}/media/c.jpg", base))], None),
            "application/json; charset=utf-8",
        ))
        .expect(1)
        .mount(server)
        .await;

    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        mount_image(server, name).await;
    }

    Mock::given(method("GET"))
        .and(path("/media/clip.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

fn audit_lines(log_dir: &Path) -> Vec<String> {
    if !log_dir.exists() {
        return Vec::new();
    }
    std::fs::read_dir(log_dir)
        .expect("Failed to read log dir")
        .flat_map(|entry| {
            let content = std::fs::read_to_string(entry.unwrap().path()).unwrap();
            content.lines().map(str::to_string).collect::<Vec<_>>()
        })
        .collect()
}

#[tokio::test]
async fn test_full_crawl_two_pages() {
    let mock_server = MockServer::start().await;
    mount_alice(&mock_server).await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), tmp.path());
    let coordinator = Coordinator::from_config(&config).expect("Failed to build coordinator");

    let report = coordinator.crawl_account(&Account::new("alice")).await;

    assert_eq!(report.outcome, AccountOutcome::Completed);
    assert_eq!(report.pages_walked, 2);
    assert_eq!(report.images_saved, 3);
    assert_eq!(report.videos_skipped, 1);

    let dir = tmp.path().join("instagram").join("instagram_alice");
    for name in ["media_a.jpg", "media_b.jpg", "media_c.jpg"] {
        assert!(dir.join(name).is_file(), "expected {} to be saved", name);
    }
    assert_eq!(
        std::fs::read_to_string(dir.join("media_c.jpg")).unwrap(),
        "jpeg:c.jpg"
    );

    let lines = audit_lines(&tmp.path().join("log"));
    assert_eq!(lines.len(), 3);
    for line in &lines {
        assert!(
            line.ends_with(" [alice]: Save a new image."),
            "unexpected log line {:?}",
            line
        );
    }
}

#[tokio::test]
async fn test_rerun_downloads_nothing_new() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            landing_page(
                "alice",
                vec![
                    node(&format!("{}/media/a.jpg", base), false),
                    node(&format!("{}/media/b.jpg", base), false),
                ],
                None,
            ),
            "text/html",
        ))
        .mount(&mock_server)
        .await;
    mount_script_bundle(&mock_server).await;
    mount_image(&mock_server, "a.jpg").await;
    mount_image(&mock_server, "b.jpg").await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base, tmp.path());
    let coordinator = Coordinator::from_config(&config).unwrap();
    let alice = Account::new("alice");

    let first = coordinator.crawl_account(&alice).await;
    let second = coordinator.crawl_account(&alice).await;

    assert_eq!(first.images_saved, 2);
    assert_eq!(second.images_saved, 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(audit_lines(&tmp.path().join("log")).len(), 2);
}

#[tokio::test]
async fn test_bad_account_does_not_stop_the_run() {
    let mock_server = MockServer::start().await;
    mount_alice(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><link href="/static/bundles/ProfilePageContainer.js" as="script"></head><body><script>window._sharedData = {"entry_data":{}};</script></body></html>"#,
            "text/html",
        ))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), tmp.path());
    let sequencer = Sequencer::new(Coordinator::from_config(&config).unwrap(), None);

    let stats = sequencer
        .run(&[Account::new("broken"), Account::new("alice")])
        .await;

    assert_eq!(stats.accounts(), 2);
    assert!(matches!(
        stats.reports[0].outcome,
        AccountOutcome::Failed { .. }
    ));
    assert_eq!(stats.reports[1].outcome, AccountOutcome::Completed);
    assert_eq!(stats.images_saved(), 3);
    assert!(!tmp.path().join("instagram/instagram_broken").exists());
}

#[tokio::test]
async fn test_failed_page_fetch_abandons_account() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/carol"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            landing_page(
                "carol",
                vec![node(&format!("{}/media/a.jpg", base), false)],
                Some("XY"),
            ),
            "text/html",
        ))
        .mount(&mock_server)
        .await;
    mount_script_bundle(&mock_server).await;
    mount_image(&mock_server, "a.jpg").await;

    Mock::given(method("GET"))
        .and(path("/graphql/query/"))
        .respond_with(
            ResponseTemplate::new(429).set_body_raw(
                r#"{"status":"fail","message":"rate limited"}"#,
                "application/json",
            ),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&base, tmp.path());
    let coordinator = Coordinator::from_config(&config).unwrap();

    let report = coordinator.crawl_account(&Account::new("carol")).await;

    assert!(matches!(report.outcome, AccountOutcome::Abandoned { .. }));
    assert_eq!(report.images_saved, 1);
    assert_eq!(report.pages_walked, 1);
}

#[tokio::test]
async fn test_missing_account_is_abandoned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nobody"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Page Not Found"))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), tmp.path());
    let coordinator = Coordinator::from_config(&config).unwrap();

    let report = coordinator.crawl_account(&Account::new("nobody")).await;

    assert!(matches!(report.outcome, AccountOutcome::Abandoned { .. }));
    assert!(audit_lines(&tmp.path().join("log")).is_empty());
}
