//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a paginated listing and run the full
//! crawl cycle end-to-end: fetch, parse, filter, export and persist.

use listing_harvest::config::{Config, ErrorPolicy};
use listing_harvest::crawler::FetchErrorKind;
use listing_harvest::output::{load_archive, write_exports};
use listing_harvest::storage::{JsonStateStore, StateStore};
use listing_harvest::{harvest, Article, CrawlPhase, CrawlState, HarvestError};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate, Times};

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.site.base_url = format!("{}/zq", server.uri());
    config.crawler.page_delay_ms = 0;
    config.crawler.retry_backoff_ms = 10;
    config.crawler.request_timeout_secs = 5;
    config.output.json_path = dir.path().join("articles.json").display().to_string();
    config.output.csv_path = dir.path().join("articles.csv").display().to_string();
    config.output.state_path = dir.path().join("crawl_state.json").display().to_string();
    config
}

/// Renders a listing page in the layout of the news column
fn listing_page(items: &[(&str, &str, &str)], paging: &str) -> String {
    let rows: String = items
        .iter()
        .map(|(title, date, url)| {
            format!(
                r#"<li><a href="{}" title="{}" target="_blank">{}</a><span>{}</span></li>"#,
                url, title, title, date
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>氢能资讯 - 新闻列表</title></head>
<body>
  <div class="cc-list-content"><ul>{}</ul></div>
  {}
</body></html>"#,
        rows, paging
    )
}

fn empty_page() -> String {
    listing_page(&[], "")
}

fn article_url(id: u32) -> String {
    format!("https://news.example.com/html/202509/{}.shtml", id)
}

async fn mount_page(server: &MockServer, route: &str, body: String, expected: impl Into<Times>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(expected)
        .mount(server)
        .await;
}

/// Seeds the state file and archive as a previous run would have left them
fn seed_previous_run(config: &Config, articles: &[Article]) {
    let mut state = CrawlState::new();
    for article in articles {
        state.record(&article.url);
    }
    JsonStateStore::new(&config.output.state_path)
        .save(&state)
        .unwrap();
    write_exports(
        articles,
        Path::new(&config.output.json_path),
        Path::new(&config.output.csv_path),
    )
    .unwrap();
}

fn load_state(config: &Config) -> CrawlState {
    JsonStateStore::new(&config.output.state_path).load().unwrap()
}

#[tokio::test]
async fn test_bootstrap_crawl_writes_exports_and_state() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    let u1 = article_url(1);
    let u2 = article_url(2);
    let u3 = article_url(3);
    mount_page(
        &server,
        "/zq",
        listing_page(&[("Third", "2025-09-15", &u3), ("Second", "2025-09-14", &u2)], ""),
        1,
    )
    .await;
    mount_page(&server, "/zq/2/", listing_page(&[("First", "2025-09-10", &u1)], ""), 1).await;
    mount_page(&server, "/zq/3/", empty_page(), 1).await;

    let report = harvest(config.clone()).await.unwrap();

    assert_eq!(report.phase, CrawlPhase::StoppedByEmptyPage);
    assert_eq!(report.new_items.len(), 3);

    let archive = load_archive(Path::new(&config.output.json_path)).unwrap();
    let urls: Vec<&str> = archive.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(urls, vec![u3.as_str(), u2.as_str(), u1.as_str()]);

    let state = load_state(&config);
    assert_eq!(state.total_articles_crawled, 3);
    assert!(state.last_crawl_timestamp.is_some());

    let csv = std::fs::read(&config.output.csv_path).unwrap();
    assert!(csv.starts_with(&[0xEF, 0xBB, 0xBF]));
    let text = String::from_utf8(csv[3..].to_vec()).unwrap();
    assert!(text.starts_with("title,date,url"));
    assert!(text.contains(&format!("Third,2025-09-15,{}", u3)));
}

#[tokio::test]
async fn test_incremental_run_stops_at_boundary() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    let known = Article::new("Known", None, article_url(1));
    seed_previous_run(&config, &[known.clone()]);

    let fresh = article_url(2);
    mount_page(
        &server,
        "/zq",
        listing_page(&[("Fresh", "2025-09-16", &fresh), ("Known", "2025-09-10", &known.url)], ""),
        1,
    )
    .await;
    mount_page(&server, "/zq/2/", listing_page(&[("Known", "2025-09-10", &known.url)], ""), 1).await;
    mount_page(
        &server,
        "/zq/3/",
        listing_page(&[("Never", "2025-09-01", &article_url(99))], ""),
        0,
    )
    .await;

    let report = harvest(config.clone()).await.unwrap();

    assert_eq!(report.phase, CrawlPhase::StoppedByBoundary);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.new_items.len(), 1);

    let state = load_state(&config);
    assert_eq!(state.len(), 2);
    assert!(state.contains(&fresh));

    let archive = load_archive(Path::new(&config.output.json_path)).unwrap();
    assert_eq!(archive.len(), 2);
    assert_eq!(archive[0].url, fresh);
}

#[tokio::test]
async fn test_rerun_on_unchanged_listing_is_idempotent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_page(
        &server,
        "/zq",
        listing_page(&[("A", "2025-09-15", &article_url(1)), ("B", "2025-09-14", &article_url(2))], ""),
        2,
    )
    .await;
    mount_page(&server, "/zq/2/", empty_page(), 1).await;

    let first = harvest(config.clone()).await.unwrap();
    let archive_after_first = std::fs::read(&config.output.json_path).unwrap();

    let second = harvest(config.clone()).await.unwrap();

    assert_eq!(first.new_items.len(), 2);
    assert!(second.new_items.is_empty());
    assert_eq!(second.phase, CrawlPhase::StoppedByBoundary);
    assert_eq!(second.state.seen_urls, first.state.seen_urls);
    assert_eq!(load_state(&config).total_articles_crawled, 2);
    assert_eq!(std::fs::read(&config.output.json_path).unwrap(), archive_after_first);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    Mock::given(method("GET"))
        .and(path("/zq"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = harvest(config.clone()).await;

    assert!(matches!(result, Err(HarvestError::PageFailed { page: 1, .. })));
    assert!(!Path::new(&config.output.state_path).exists());
    assert!(!Path::new(&config.output.json_path).exists());
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    Mock::given(method("GET"))
        .and(path("/zq"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "/zq", listing_page(&[("A", "2025-09-15", &article_url(1))], ""), 1).await;
    mount_page(&server, "/zq/2/", empty_page(), 1).await;

    let report = harvest(config).await.unwrap();

    assert_eq!(report.new_items.len(), 1);
}

#[tokio::test]
async fn test_too_many_requests_is_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    Mock::given(method("GET"))
        .and(path("/zq"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/zq", listing_page(&[("A", "2025-09-15", &article_url(1))], ""), 1).await;
    mount_page(&server, "/zq/2/", empty_page(), 1).await;

    let report = harvest(config).await.unwrap();

    assert_eq!(report.new_items.len(), 1);
}

#[tokio::test]
async fn test_exhausted_retries_report_attempts_and_last_cause() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_retries = 3;

    Mock::given(method("GET"))
        .and(path("/zq"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let result = harvest(config).await;

    let (page, source) = match result {
        Err(HarvestError::PageFailed { page, source }) => (page, source),
        other => panic!("expected a page failure, got {:?}", other.map(|r| r.phase)),
    };
    assert_eq!(page, 1);
    assert!(source.url.ends_with("/zq"));
    assert_eq!(
        source.kind,
        FetchErrorKind::RetriesExhausted {
            attempts: 3,
            last: Box::new(FetchErrorKind::HttpStatus(503)),
        }
    );
}

#[tokio::test]
async fn test_slow_page_times_out_per_attempt() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.request_timeout_secs = 1;
    config.crawler.max_retries = 2;

    Mock::given(method("GET"))
        .and(path("/zq"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&[("Late", "2025-09-15", &article_url(1))], ""))
                .set_delay(Duration::from_millis(2500)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let result = harvest(config.clone()).await;

    let source = match result {
        Err(HarvestError::PageFailed { source, .. }) => source,
        other => panic!("expected a page failure, got {:?}", other.map(|r| r.phase)),
    };
    assert_eq!(
        source.kind,
        FetchErrorKind::RetriesExhausted {
            attempts: 2,
            last: Box::new(FetchErrorKind::Timeout),
        }
    );
    assert!(!Path::new(&config.output.state_path).exists());
}

#[tokio::test]
async fn test_block_page_is_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    Mock::given(method("GET"))
        .and(path("/zq"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>denied</html>"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/zq", listing_page(&[("A", "2025-09-15", &article_url(1))], ""), 1).await;
    mount_page(&server, "/zq/2/", empty_page(), 1).await;

    let report = harvest(config).await.unwrap();

    assert_eq!(report.new_items.len(), 1);
}

#[tokio::test]
async fn test_failed_run_leaves_previous_files_untouched() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_retries = 2;

    seed_previous_run(&config, &[Article::new("Known", None, article_url(1))]);
    let state_before = std::fs::read(&config.output.state_path).unwrap();
    let archive_before = std::fs::read(&config.output.json_path).unwrap();
    let csv_before = std::fs::read(&config.output.csv_path).unwrap();

    mount_page(&server, "/zq", listing_page(&[("Fresh", "2025-09-16", &article_url(2))], ""), 1).await;
    Mock::given(method("GET"))
        .and(path("/zq/2/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let result = harvest(config.clone()).await;

    assert!(matches!(result, Err(HarvestError::PageFailed { page: 2, .. })));
    assert_eq!(std::fs::read(&config.output.state_path).unwrap(), state_before);
    assert_eq!(std::fs::read(&config.output.json_path).unwrap(), archive_before);
    assert_eq!(std::fs::read(&config.output.csv_path).unwrap(), csv_before);
}

#[tokio::test]
async fn test_resilient_mode_skips_failed_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.on_page_error = ErrorPolicy::Skip;
    config.crawler.bootstrap_max_pages = 3;

    mount_page(&server, "/zq", listing_page(&[("A", "2025-09-15", &article_url(1))], ""), 1).await;
    Mock::given(method("GET"))
        .and(path("/zq/2/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/zq/3/", listing_page(&[("C", "2025-09-13", &article_url(3))], ""), 1).await;

    let report = harvest(config.clone()).await.unwrap();

    assert_eq!(report.phase, CrawlPhase::StoppedByPageLimit);
    assert_eq!(report.page_errors.len(), 1);
    assert_eq!(load_state(&config).len(), 2);
}

#[tokio::test]
async fn test_last_page_signal_stops_paging() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    let paging = r#"<div class="cc-paging"><a href="/zq">1</a><span class="cur">1</span><a class="next disabled">下一页</a></div>"#;
    mount_page(&server, "/zq", listing_page(&[("Only", "2025-09-15", &article_url(1))], paging), 1).await;
    mount_page(&server, "/zq/2/", empty_page(), 0).await;

    let report = harvest(config).await.unwrap();

    assert_eq!(report.phase, CrawlPhase::StoppedByLastPage);
    assert_eq!(report.pages_fetched, 1);
}

#[tokio::test]
async fn test_non_latin_titles_survive_export() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    let title = "国家能源局：推动氢能产业高质量发展";
    mount_page(&server, "/zq", listing_page(&[(title, "2025年09月15日", &article_url(7))], ""), 1).await;
    mount_page(&server, "/zq/2/", empty_page(), 1).await;

    harvest(config.clone()).await.unwrap();

    let archive = load_archive(Path::new(&config.output.json_path)).unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive[0].title, title);
    assert_eq!(archive[0].date_string(), "2025-09-15");

    let csv = std::fs::read_to_string(&config.output.csv_path).unwrap();
    assert!(csv.contains(title));
}

#[tokio::test]
async fn test_empty_first_run_fails() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_page(&server, "/zq", empty_page(), 1).await;

    let result = harvest(config.clone()).await;

    assert!(matches!(result, Err(HarvestError::EmptyBootstrap)));
    assert!(!Path::new(&config.output.state_path).exists());
}

#[tokio::test]
async fn test_items_from_a_failed_export_are_reported_on_retry() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);

    let known = Article::new("Known", None, article_url(1));
    seed_previous_run(&config, &[known.clone()]);
    let archive_before = std::fs::read(&config.output.json_path).unwrap();

    let fresh = article_url(2);
    mount_page(
        &server,
        "/zq",
        listing_page(&[("Fresh", "2025-09-16", &fresh), ("Known", "2025-09-10", &known.url)], ""),
        2,
    )
    .await;
    mount_page(&server, "/zq/2/", listing_page(&[("Known", "2025-09-10", &known.url)], ""), 2).await;

    let good_csv = config.output.csv_path.clone();
    config.output.csv_path = dir.path().join("missing").join("articles.csv").display().to_string();

    let result = harvest(config.clone()).await;
    assert!(matches!(result, Err(HarvestError::Output(_))));
    assert_eq!(std::fs::read(&config.output.json_path).unwrap(), archive_before);

    config.output.csv_path = good_csv;
    let report = harvest(config.clone()).await.unwrap();

    assert_eq!(report.new_items.len(), 1);
    assert_eq!(report.new_items[0].url, fresh);
    assert!(load_state(&config).contains(&fresh));
}
