//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use async_trait::async_trait;
use sitegleaner::config::UserAgentConfig;
use sitegleaner::crawler::{
    build_http_client, CrawlOptions, CrawlRequest, Crawler, Fetcher, PageResult, RenderError,
    RenderedPage, Renderer,
};
use sitegleaner::GleanError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body, "text/html; charset=utf-8")
}

/// Page with a title and one anchor per link
fn page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><main>{} content</main>{}</body></html>",
        title, title, anchors
    )
}

async fn mount_page(server: &MockServer, at: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(html(&body))
        .expect(times)
        .mount(server)
        .await;
}

fn fetcher(timeout: Duration) -> Fetcher {
    let client = build_http_client(&UserAgentConfig::default(), timeout)
        .expect("Failed to build HTTP client");
    Fetcher::new(client)
}

fn crawler(workers: usize) -> Crawler {
    Crawler::new(
        fetcher(Duration::from_secs(5)),
        CrawlOptions {
            workers,
            ..CrawlOptions::default()
        },
    )
}

fn request(server: &MockServer, max_depth: u32, max_pages: usize) -> CrawlRequest {
    CrawlRequest::new(&format!("{}/", server.uri()), max_depth, max_pages)
        .expect("Failed to build crawl request")
}

fn urls(results: &[PageResult]) -> Vec<String> {
    results.iter().map(|r| r.url().to_string()).collect()
}

/// Renderer that serves fixed HTML without a browser
struct StaticRenderer {
    html: String,
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn render(&self, url: &Url, _timeout: Duration) -> Result<RenderedPage, RenderError> {
        Ok(RenderedPage {
            url: url.clone(),
            html: self.html.clone(),
        })
    }
}

#[tokio::test]
async fn test_depth_zero_fetches_only_seed() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/a", "/b"]), 1).await;
    mount_page(&server, "/a", page("A", &[]), 0).await;
    mount_page(&server, "/b", page("B", &[]), 0).await;

    let results = crawler(4).crawl(&request(&server, 0, 5)).await;

    assert_eq!(results.len(), 1);
    let seed = results[0].as_success().expect("seed should succeed");
    assert_eq!(seed.title.as_deref(), Some("Home"));
    assert_eq!(seed.content_summary, "Home content");
}

#[tokio::test]
async fn test_failed_seed_yields_single_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_string(page("Oops", &["/a"])))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/a", page("A", &[]), 0).await;

    let results = crawler(4).crawl(&request(&server, 2, 5)).await;

    assert_eq!(results.len(), 1);
    let failure = results[0].as_failure().expect("seed should fail");
    assert_eq!(failure.url, format!("{}/", server.uri()));
    assert_eq!(failure.error, "HTTP 500");
}

#[tokio::test]
async fn test_external_links_never_enqueued() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        page(
            "Home",
            &[
                "/one",
                "/two",
                "three",
                "https://external.invalid/x",
                "http://other.invalid/y",
            ],
        ),
        1,
    )
    .await;
    for at in ["/one", "/two", "/three"] {
        mount_page(&server, at, page(at, &[]), 1).await;
    }

    let results = crawler(4).crawl(&request(&server, 1, 10)).await;

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(PageResult::is_success));
    assert!(urls(&results)
        .iter()
        .all(|u| u.starts_with(&server.uri())));
}

#[tokio::test]
async fn test_budget_smaller_than_graph() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        page("Home", &["/p1", "/p2", "/p3", "/p4", "/p5"]),
        1,
    )
    .await;
    mount_page(&server, "/p1", page("P1", &[]), 1).await;
    for at in ["/p2", "/p3", "/p4", "/p5"] {
        mount_page(&server, at, page(at, &[]), 0).await;
    }

    let results = crawler(1).crawl(&request(&server, 3, 2)).await;

    assert_eq!(
        urls(&results),
        vec![format!("{}/", server.uri()), format!("{}/p1", server.uri())]
    );
}

#[tokio::test]
async fn test_depth_limit_not_exceeded() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/level1"]), 1).await;
    mount_page(&server, "/level1", page("Level 1", &["/level2"]), 1).await;
    mount_page(&server, "/level2", page("Level 2", &[]), 0).await;

    let results = crawler(4).crawl(&request(&server, 1, 10)).await;

    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_breadth_first_order() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/a", "/b"]), 1).await;
    mount_page(&server, "/a", page("A", &["/a/deep"]), 1).await;
    mount_page(&server, "/b", page("B", &[]), 1).await;
    mount_page(&server, "/a/deep", page("Deep", &[]), 1).await;

    let results = crawler(1).crawl(&request(&server, 2, 10)).await;

    let base = server.uri();
    assert_eq!(
        urls(&results),
        vec![
            format!("{}/", base),
            format!("{}/a", base),
            format!("{}/b", base),
            format!("{}/a/deep", base),
        ]
    );
}

#[tokio::test]
async fn test_cycles_fetched_once() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/a", "/b", "/#top"]), 1).await;
    mount_page(&server, "/a", page("A", &["/", "/b", "/a#section"]), 1).await;
    mount_page(&server, "/b", page("B", &["/a", "/"]), 1).await;

    let results = crawler(4).crawl(&request(&server, 5, 50)).await;

    let fetched = urls(&results);
    let unique: HashSet<&String> = fetched.iter().collect();
    assert_eq!(fetched.len(), 3);
    assert_eq!(unique.len(), 3);
}

#[tokio::test]
async fn test_failed_page_does_not_stop_siblings() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/broken", "/ok"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/ok", page("OK", &["/ok/child"]), 1).await;
    mount_page(&server, "/ok/child", page("Child", &[]), 1).await;

    let results = crawler(2).crawl(&request(&server, 2, 10)).await;

    assert_eq!(results.len(), 4);
    let failures: Vec<_> = results.iter().filter_map(PageResult::as_failure).collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].url.ends_with("/broken"));
}

#[tokio::test]
async fn test_links_resolved_against_redirect_target() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old/index"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new/index", server.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/new/index", page("Moved", &["child"]), 1).await;
    mount_page(&server, "/new/child", page("Child", &[]), 1).await;
    mount_page(&server, "/old/child", page("Stale", &[]), 0).await;

    let request = CrawlRequest::new(&format!("{}/old/index", server.uri()), 1, 10)
        .expect("Failed to build crawl request");
    let results = crawler(4).crawl(&request).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(PageResult::is_success));
    assert_eq!(results[0].url(), format!("{}/old/index", server.uri()));
    assert_eq!(results[1].url(), format!("{}/new/child", server.uri()));
}

#[tokio::test]
async fn test_non_html_page_is_failure() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/report.pdf"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;

    let results = crawler(4).crawl(&request(&server, 1, 10)).await;

    assert_eq!(results.len(), 2);
    let failure = results[1].as_failure().expect("pdf should fail");
    assert!(failure.error.contains("application/pdf"));
}

#[tokio::test]
async fn test_slow_page_times_out_as_failure() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/slow", "/fast"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(&page("Slow", &[])).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    mount_page(&server, "/fast", page("Fast", &[]), 1).await;

    let crawler = Crawler::new(fetcher(Duration::from_millis(500)), CrawlOptions::default());
    let results = crawler.crawl(&request(&server, 1, 10)).await;

    assert_eq!(results.len(), 3);
    let slow = results
        .iter()
        .find(|r| r.url().ends_with("/slow"))
        .and_then(PageResult::as_failure)
        .expect("slow page should fail");
    assert_eq!(slow.error, "request timed out");
    assert_eq!(results.iter().filter(|r| r.is_success()).count(), 2);
}

#[tokio::test]
async fn test_rendered_fallback_recovers_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let renderer = Arc::new(StaticRenderer {
        html: page("Rendered", &[]),
    });
    let crawler = Crawler::new(
        fetcher(Duration::from_secs(2)).with_renderer(renderer, Duration::from_secs(2)),
        CrawlOptions::default(),
    );
    let results = crawler.crawl(&request(&server, 0, 5)).await;

    assert_eq!(results.len(), 1);
    let summary = results[0].as_success().expect("fallback should succeed");
    assert_eq!(summary.title.as_deref(), Some("Rendered"));
}

#[tokio::test]
async fn test_cancellation_returns_partial_results() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/slow1", "/slow2"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/slow1"))
        .respond_with(html(&page("Slow 1", &[])).set_delay(Duration::from_secs(1)))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/slow2", page("Slow 2", &[]), 0).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let results = crawler(1)
        .crawl_until(&request(&server, 1, 10), cancel)
        .await;

    // The in-flight page is allowed to finish; nothing new is claimed
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(PageResult::is_success));
}

#[tokio::test]
async fn test_already_cancelled_crawl_is_empty() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &[]), 0).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let results = crawler(4).crawl_until(&request(&server, 1, 10), cancel).await;

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_deadline_returns_partial_results() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/slow1", "/slow2"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/slow1"))
        .respond_with(html(&page("Slow 1", &[])).set_delay(Duration::from_secs(1)))
        .mount(&server)
        .await;
    mount_page(&server, "/slow2", page("Slow 2", &[]), 0).await;

    let crawler = Crawler::new(
        fetcher(Duration::from_secs(5)),
        CrawlOptions {
            workers: 1,
            deadline: Some(Duration::from_millis(300)),
            ..CrawlOptions::default()
        },
    );
    let results = crawler.crawl(&request(&server, 1, 10)).await;

    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_crawl_many_concatenates_in_seed_order() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs", page("Docs", &["/docs/a"]), 1).await;
    mount_page(&server, "/blog", page("Blog", &[]), 1).await;

    let seeds = vec![
        format!("{}/docs", server.uri()),
        format!("{}/blog", server.uri()),
    ];
    let results = crawler(4)
        .crawl_many(&seeds, 0, 5, CancellationToken::new())
        .await
        .expect("valid seeds");

    assert_eq!(urls(&results), seeds);
}

#[tokio::test]
async fn test_crawl_many_rejects_bad_seed_before_io() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &[]), 0).await;

    let seeds = vec![format!("{}/", server.uri()), "not a url".to_string()];
    let result = crawler(4)
        .crawl_many(&seeds, 1, 5, CancellationToken::new())
        .await;

    assert!(matches!(result, Err(GleanError::InvalidSeed(_))));
}

#[tokio::test]
async fn test_crawl_entry_point_validates_input() {
    assert!(matches!(
        sitegleaner::crawl("/relative/path", 1, 5).await,
        Err(GleanError::InvalidSeed(_))
    ));
    assert!(matches!(
        sitegleaner::crawl("https://example.com/", 1, 0).await,
        Err(GleanError::InvalidBudget(_))
    ));
}
