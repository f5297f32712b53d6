//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end over real HTTP.

use ripple_crawler::config::Config;
use ripple_crawler::crawler::{crawl, Crawler};
use ripple_crawler::{CrawlError, FailureCause};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fast config for tests: no politeness delay, short retries
fn test_config(max_depth: u32, max_concurrency: u32) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.max_concurrency = max_concurrency;
    config.crawler.timeout = 2_000;
    config.crawler.max_retries = 2;
    config.crawler.retry_delay = 10;
    config.crawler.delay_between_requests = 0;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.user_agent.crawler_version = "1.0.0".to_string();
    config
}

fn html(title: &str, links: &[String]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|l| format!("<a href=\"{}\">{}</a>\n", l, l))
        .collect();
    ResponseTemplate::new(200)
        .set_body_raw(
            format!(
                "<html><head><title>{}</title></head><body>{}</body></html>",
                title, anchors
            ),
            "text/html; charset=utf-8",
        )
}

async fn mount_page(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_depth_limited() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html("Home", &["/p1".to_string(), "/p2".to_string()]),
    )
    .await;
    mount_page(&server, "/p1", html("Page 1", &["/deep".to_string()])).await;
    mount_page(&server, "/p2", html("Page 2", &["/p1".to_string()])).await;

    // Depth 2 is past the limit
    Mock::given(method("GET"))
        .and(path("/deep"))
        .respond_with(html("Deep", &[]))
        .expect(0)
        .mount(&server)
        .await;

    let seed = format!("{}/", server.uri());
    let report = crawl(&seed, test_config(1, 2)).await.expect("Crawl failed");

    assert_eq!(report.results.len(), 3);
    assert!(report.failures.is_empty());
    assert_eq!(report.metrics.total_crawled, 3);
    assert_eq!(report.metrics.distinct_hosts_crawled, 1);
    assert!(report.results.iter().all(|r| r.depth <= 1));

    let home = report.results.iter().find(|r| r.url == seed).unwrap();
    assert_eq!(home.title.as_deref(), Some("Home"));
    assert_eq!(home.depth, 0);
    assert_eq!(home.links_found, 2);
    assert_eq!(home.attempts, 1);
    assert_eq!(home.content_type, "text/html; charset=utf-8");
}

#[tokio::test]
async fn test_other_origin_never_requested() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html(
            "Home",
            &[format!("{}/elsewhere", other.uri()), "/local".to_string()],
        ),
    )
    .await;
    mount_page(&server, "/local", html("Local", &[])).await;

    Mock::given(method("GET"))
        .respond_with(html("Elsewhere", &[]))
        .expect(0)
        .mount(&other)
        .await;

    let report = crawl(&format!("{}/", server.uri()), test_config(3, 2))
        .await
        .expect("Crawl failed");

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.discovered_count(), 2);
}

#[tokio::test]
async fn test_non_html_content_not_parsed() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html("Home", &["/data.json".to_string(), "/page".to_string()]),
    )
    .await;
    mount_page(
        &server,
        "/data.json",
        ResponseTemplate::new(200)
            .set_body_raw(
                r#"{"link": "<a href=\"/hidden\">x</a>"}"#,
                "application/json",
            ),
    )
    .await;
    mount_page(&server, "/page", html("Page", &[])).await;

    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html("Hidden", &[]))
        .expect(0)
        .mount(&server)
        .await;

    let report = crawl(&format!("{}/", server.uri()), test_config(3, 2))
        .await
        .expect("Crawl failed");

    let json = report
        .results
        .iter()
        .find(|r| r.url.ends_with("/data.json"))
        .unwrap();
    assert_eq!(json.title, None);
    assert_eq!(json.links_found, 0);
    assert_eq!(json.content_type, "application/json");
}

#[tokio::test]
async fn test_http_errors_recorded_not_retried() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html("Home", &["/broken".to_string(), "/gone".to_string()]),
    )
    .await;
    mount_page(&server, "/broken", ResponseTemplate::new(500)).await;
    mount_page(&server, "/gone", ResponseTemplate::new(404)).await;

    let report = crawl(&format!("{}/", server.uri()), test_config(1, 2))
        .await
        .expect("Crawl failed");

    let mut statuses: Vec<u16> = report.results.iter().map(|r| r.status).collect();
    statuses.sort();
    assert_eq!(statuses, vec![200, 404, 500]);
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn test_slow_pages_still_drain() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html("Home", &["/fast".to_string(), "/slow".to_string()]),
    )
    .await;
    mount_page(&server, "/fast", html("Fast", &[])).await;
    mount_page(
        &server,
        "/slow",
        html("Slow", &["/after1".to_string(), "/after2".to_string()])
            .set_delay(Duration::from_millis(300)),
    )
    .await;
    mount_page(&server, "/after1", html("After 1", &["/".to_string()])).await;
    mount_page(&server, "/after2", html("After 2", &[])).await;

    let report = crawl(&format!("{}/", server.uri()), test_config(5, 4))
        .await
        .expect("Crawl failed");

    assert_eq!(report.results.len(), 5);
    assert_eq!(report.visited_count(), 5);
}

#[tokio::test]
async fn test_timeout_exhausts_retries() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html("Home", &["/hang".to_string()])).await;
    Mock::given(method("GET"))
        .and(path("/hang"))
        .respond_with(html("Hang", &[]).set_delay(Duration::from_millis(500)))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = test_config(1, 1);
    config.crawler.timeout = 100;

    let report = crawl(&format!("{}/", server.uri()), config)
        .await
        .expect("Crawl failed");

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.failures.len(), 1);

    let failure = &report.failures[0];
    assert!(failure.url.ends_with("/hang"));
    assert_eq!(failure.cause, FailureCause::Timeout);
    assert_eq!(failure.attempts, 3);
}

#[tokio::test]
async fn test_unreachable_seed_reported_as_failure() {
    // Bind then release a port so nothing is listening on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let crawler = Crawler::new(test_config(1, 1))
        .expect("Failed to build crawler")
        .report_failures_to(tx);

    let report = crawler
        .run(&format!("http://127.0.0.1:{}/", port))
        .await
        .expect("Crawl failed");

    assert!(report.results.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].attempts, 3);

    let streamed = rx.recv().await.unwrap();
    assert_eq!(streamed, report.failures[0]);
}

#[tokio::test]
async fn test_user_agent_header_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0.0"))
        .respond_with(html("Home", &[]))
        .expect(1)
        .mount(&server)
        .await;

    let report = crawl(&format!("{}/", server.uri()), test_config(0, 1))
        .await
        .expect("Crawl failed");

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].status, 200);
}

#[tokio::test]
async fn test_search_over_crawled_pages() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html("Home", &["/rust-guide".to_string(), "/about".to_string()]),
    )
    .await;
    mount_page(&server, "/rust-guide", html("Guide", &[])).await;
    mount_page(&server, "/about", html("About Rust", &[])).await;

    let report = crawl(&format!("{}/", server.uri()), test_config(1, 2))
        .await
        .expect("Crawl failed");

    let hits = report.search("RUST");
    assert_eq!(hits.len(), 2);
    assert!(report.search("python").is_empty());
}

#[tokio::test]
async fn test_invalid_seed_rejected() {
    let result = crawl("ftp://example.com/", test_config(1, 1)).await;
    assert!(matches!(result, Err(CrawlError::InvalidSeedUrl { .. })));

    let result = crawl("not a url", test_config(1, 1)).await;
    assert!(matches!(result, Err(CrawlError::InvalidSeedUrl { .. })));
}
