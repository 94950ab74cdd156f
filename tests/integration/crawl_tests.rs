//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the link API and test
//! the fetcher and the full pipeline end-to-end.

use link_ripple::config::{ApiConfig, Config, HttpConfig};
use link_ripple::crawler::{CrawlPipeline, FetchError, LinkFetcher};
use link_ripple::http::RetryingHttpClient;
use link_ripple::output::{MemorySink, RunStatus};
use link_ripple::{PageRecord, RippleError};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PATH: &str = "/w/api.php";

/// Builds a link API body for `title` with the given (link, namespace) pairs
fn links_body(title: &str, links: &[(&str, i64)], cursor: Option<&str>) -> Value {
    let links: Vec<Value> = links
        .iter()
        .map(|(link, ns)| json!({"ns": ns, "title": link}))
        .collect();

    let mut body = json!({
        "query": {"pages": {"42": {"pageid": 42, "ns": 0, "title": title, "links": links}}}
    });
    if let Some(cursor) = cursor {
        body["continue"] = json!({"plcontinue": cursor, "continue": "||"});
    }
    body
}

fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        endpoint: format!("{}{}", server.uri(), API_PATH),
        ..ApiConfig::default()
    }
}

fn http_config() -> HttpConfig {
    HttpConfig {
        backoff_base_ms: 1,
        user_agent: "LinkRippleTest/1.0".to_string(),
        ..HttpConfig::default()
    }
}

fn fetcher_for(server: &MockServer) -> LinkFetcher {
    let http = Arc::new(RetryingHttpClient::new(&http_config()).expect("client"));
    LinkFetcher::new(http, &api_config(server)).expect("fetcher")
}

fn frontier(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp frontier");
    for line in lines {
        writeln!(file, "{}", line).expect("write frontier");
    }
    file.flush().expect("flush frontier");
    file
}

fn pipeline_config(server: &MockServer, frontier: &NamedTempFile) -> Config {
    let mut config = Config::default();
    config.http = http_config();
    config.api = api_config(server);
    config.pool.workers = 4;
    config.pool.queue_capacity = 2;
    config.pool.output_capacity = 2;
    config.crawler.frontier_path = frontier.path().to_path_buf();
    config
}

async fn mount_page(server: &MockServer, title: &str, links: &[(&str, i64)]) {
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("titles", title))
        .respond_with(ResponseTemplate::new(200).set_body_json(links_body(title, links, None)))
        .mount(server)
        .await;
}

fn sorted_names(records: &[PageRecord]) -> Vec<String> {
    let mut names: Vec<_> = records.iter().map(|r| r.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_only_main_namespace_links_are_kept() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "Cat",
        &[("Animal", 0), ("Talk:Cat", 1), ("Mammal", 0), ("User:Bob", 2)],
    )
    .await;

    let links = fetcher_for(&server)
        .fetch_links("Cat", &CancellationToken::new())
        .await
        .expect("fetch");

    assert_eq!(links, vec!["Animal", "Mammal"]);
}

#[tokio::test]
async fn test_request_carries_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("action", "query"))
        .and(query_param("prop", "links"))
        .and(query_param("format", "json"))
        .and(query_param("plnamespace", "0"))
        .and(query_param("pllimit", "max"))
        .and(query_param("titles", "Cat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(links_body("Cat", &[], None)))
        .expect(1)
        .mount(&server)
        .await;

    let links = fetcher_for(&server)
        .fetch_links("Cat", &CancellationToken::new())
        .await
        .expect("fetch");

    assert!(links.is_empty());
}

#[tokio::test]
async fn test_pagination_concatenates_batches_in_order() {
    let server = MockServer::start().await;

    // Cursor-specific mock first so it wins over the catch-all below
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("plcontinue", "42|0|Mouse"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(links_body("Cat", &[("Mouse", 0), ("Whisker", 0)], None)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("titles", "Cat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(links_body(
            "Cat",
            &[("Animal", 0), ("Dog", 0)],
            Some("42|0|Mouse"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let links = fetcher_for(&server)
        .fetch_links("Cat", &CancellationToken::new())
        .await
        .expect("fetch");

    assert_eq!(links, vec!["Animal", "Dog", "Mouse", "Whisker"]);
}

#[tokio::test]
async fn test_pagination_stops_after_last_cursor() {
    let server = MockServer::start().await;

    // Cursors c3, c2, c1, then none: four calls in total
    let chain = [("c3", Some("c2")), ("c2", Some("c1")), ("c1", None)];
    for (cursor, next) in chain {
        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("plcontinue", cursor))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(links_body("Cat", &[(cursor, 0)], next)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(links_body("Cat", &[("c4", 0)], Some("c3"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let links = fetcher_for(&server)
        .fetch_links("Cat", &CancellationToken::new())
        .await
        .expect("fetch");

    assert_eq!(links, vec!["c4", "c3", "c2", "c1"]);
}

#[tokio::test]
async fn test_duplicate_links_are_passed_through() {
    let server = MockServer::start().await;
    mount_page(&server, "Cat", &[("Dog", 0), ("Dog", 0)]).await;

    let links = fetcher_for(&server)
        .fetch_links("Cat", &CancellationToken::new())
        .await
        .expect("fetch");

    assert_eq!(links, vec!["Dog", "Dog"]);
}

#[tokio::test]
async fn test_missing_page_yields_empty_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchcomplete": "",
            "query": {"pages": {"-1": {"ns": 0, "title": "Nowhere", "missing": ""}}}
        })))
        .mount(&server)
        .await;

    let links = fetcher_for(&server)
        .fetch_links("Nowhere", &CancellationToken::new())
        .await
        .expect("fetch");

    assert!(links.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher_for(&server)
        .fetch_links("Cat", &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(FetchError::Decode(_))));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher_for(&server)
        .fetch_links("Cat", &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(FetchError::Status { status: 404 })));
}

#[tokio::test]
async fn test_full_crawl_skips_blank_lines() {
    let server = MockServer::start().await;
    mount_page(&server, "Cat", &[("Animal", 0), ("Talk:Cat", 1)]).await;
    mount_page(&server, "Dog", &[("Wolf", 0)]).await;

    let file = frontier(&["Cat", "", "Dog"]);
    let sink = MemorySink::new();

    let report = CrawlPipeline::new(pipeline_config(&server, &file))
        .expect("pipeline")
        .with_sink(sink.clone())
        .run(CancellationToken::new())
        .await
        .expect("crawl");

    assert_eq!(report.submitted, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.total_links, 2);
    assert_eq!(report.status, RunStatus::Completed);

    let records = sink.records();
    assert_eq!(sorted_names(&records), vec!["Cat", "Dog"]);
    let cat = records.iter().find(|r| r.name == "Cat").expect("Cat record");
    assert_eq!(cat.neighbors, vec!["Animal"]);
}

#[tokio::test]
async fn test_server_errors_become_task_errors() {
    let server = MockServer::start().await;
    mount_page(&server, "Cat", &[("Animal", 0)]).await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("titles", "Broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let file = frontier(&["Cat", "Broken"]);
    let sink = MemorySink::new();

    let report = CrawlPipeline::new(pipeline_config(&server, &file))
        .expect("pipeline")
        .with_sink(sink.clone())
        .run(CancellationToken::new())
        .await
        .expect("crawl");

    assert_eq!(report.submitted, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.cancelled, 0);
    assert_eq!(sorted_names(&sink.records()), vec!["Cat"]);
}

#[tokio::test]
async fn test_every_frontier_entry_is_accounted_for() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(links_body("Any", &[("Link", 0)], None)),
        )
        .mount(&server)
        .await;

    let names: Vec<String> = (0..150).map(|i| format!("Page {}", i)).collect();
    let mut lines: Vec<&str> = names.iter().map(String::as_str).collect();
    lines.insert(10, "");
    lines.insert(50, "   ");
    let file = frontier(&lines);

    let mut config = pipeline_config(&server, &file);
    config.crawler.frontier_buffer = 4;
    let sink = MemorySink::new();

    let report = CrawlPipeline::new(config)
        .expect("pipeline")
        .with_sink(sink.clone())
        .run(CancellationToken::new())
        .await
        .expect("crawl");

    assert_eq!(report.submitted, 150);
    assert_eq!(report.outcomes(), 150);
    assert_eq!(sink.records().len(), 150);
}

#[tokio::test]
async fn test_cancellation_stops_run_promptly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(links_body("Slow", &[], None))
                .set_delay(Duration::from_secs(60)),
        )
        .mount(&server)
        .await;

    let names: Vec<String> = (0..20).map(|i| format!("Slow {}", i)).collect();
    let lines: Vec<&str> = names.iter().map(String::as_str).collect();
    let file = frontier(&lines);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let report = CrawlPipeline::new(pipeline_config(&server, &file))
        .expect("pipeline")
        .with_sink(MemorySink::new())
        .run(cancel)
        .await
        .expect("crawl");

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(report.status, RunStatus::Interrupted);
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.outcomes(), report.submitted);
    assert_eq!(report.cancelled, report.failed);
    assert!(report.submitted < 20);
}

#[tokio::test]
async fn test_deadline_cancels_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(links_body("Slow", &[], None))
                .set_delay(Duration::from_secs(60)),
        )
        .mount(&server)
        .await;

    let file = frontier(&["Slow A", "Slow B"]);
    let mut config = pipeline_config(&server, &file);
    config.crawler.deadline_secs = 1;

    let started = Instant::now();
    let report = CrawlPipeline::new(config)
        .expect("pipeline")
        .with_sink(MemorySink::new())
        .run(CancellationToken::new())
        .await
        .expect("crawl");

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(report.status, RunStatus::DeadlineExceeded);
    assert_eq!(report.submitted, 2);
    assert_eq!(report.cancelled, 2);
}

#[tokio::test]
async fn test_missing_frontier_fails_run() {
    let server = MockServer::start().await;
    let file = frontier(&[]);
    let mut config = pipeline_config(&server, &file);
    config.crawler.frontier_path = "/nonexistent/seed_names.txt".into();

    let result = CrawlPipeline::new(config)
        .expect("pipeline")
        .with_sink(MemorySink::new())
        .run(CancellationToken::new())
        .await;

    assert!(matches!(result, Err(RippleError::Frontier { .. })));
}

#[tokio::test]
async fn test_frontier_read_failure_cancels_in_flight_work() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(links_body("Slow", &[], None))
                .set_delay(Duration::from_secs(60)),
        )
        .mount(&server)
        .await;

    // Valid entries followed by a line that is not UTF-8
    let mut file = NamedTempFile::new().expect("temp frontier");
    file.write_all(b"Slow A\nSlow B\nSlow C\n\xff\xfe\nSlow D\n")
        .expect("write frontier");
    file.flush().expect("flush frontier");

    let started = Instant::now();
    let result = CrawlPipeline::new(pipeline_config(&server, &file))
        .expect("pipeline")
        .with_sink(MemorySink::new())
        .run(CancellationToken::new())
        .await;

    assert!(started.elapsed() < Duration::from_secs(10));
    let (source, report) = match result {
        Err(RippleError::Frontier { source, report, .. }) => (source, report),
        other => panic!("expected a frontier error, got {:?}", other.map(|r| r.status)),
    };
    assert_eq!(source.kind(), std::io::ErrorKind::InvalidData);
    assert_eq!(report.status, RunStatus::Interrupted);
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.outcomes(), report.submitted);
    assert_eq!(report.cancelled, report.failed);
    assert!(report.submitted <= 3);
}

#[tokio::test]
async fn test_records_written_as_json_lines() {
    let server = MockServer::start().await;
    mount_page(&server, "Cat", &[("Animal", 0), ("Mammal", 0)]).await;

    let file = frontier(&["Cat"]);
    let out_dir = tempfile::tempdir().expect("temp dir");
    let records_path = out_dir.path().join("records.jsonl");

    let mut config = pipeline_config(&server, &file);
    config.output.records_path = Some(records_path.clone());

    let report = CrawlPipeline::new(config)
        .expect("pipeline")
        .run(CancellationToken::new())
        .await
        .expect("crawl");
    assert_eq!(report.succeeded, 1);

    let content = std::fs::read_to_string(&records_path).expect("records file");
    let records: Vec<PageRecord> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("record line"))
        .collect();

    assert_eq!(
        records,
        vec![PageRecord {
            name: "Cat".to_string(),
            neighbors: vec!["Animal".to_string(), "Mammal".to_string()],
        }]
    );
}
