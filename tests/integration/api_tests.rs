//! Integration tests for the HTTP layer
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; crawled
//! sites are wiremock servers and the completion service is a fake.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sitegleaner::answer::{AnswerError, AnswerService};
use sitegleaner::api::{create_router, AppState};
use sitegleaner::config::UserAgentConfig;
use sitegleaner::crawler::{build_http_client, CrawlOptions, Crawler, Fetcher};
use sitegleaner::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Completion service that echoes how many sources it was given
struct FakeAnswerer;

#[async_trait]
impl AnswerService for FakeAnswerer {
    async fn complete(&self, prompt: &str) -> Result<String, AnswerError> {
        let sources = prompt.matches("Source [").count();
        Ok(format!("Answered from {} sources.", sources))
    }
}

/// Completion service whose upstream is always down
struct FailingAnswerer;

#[async_trait]
impl AnswerService for FailingAnswerer {
    async fn complete(&self, _prompt: &str) -> Result<String, AnswerError> {
        Err(AnswerError::Api {
            status: 503,
            message: "overloaded".to_string(),
        })
    }
}

fn app_with(answerer: Arc<dyn AnswerService>) -> Router {
    let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(2))
        .expect("Failed to build HTTP client");
    let state = AppState {
        crawler: Arc::new(Crawler::new(Fetcher::new(client), CrawlOptions::default())),
        answerer,
        store: Arc::new(MemoryStore::new(chrono::Duration::hours(1), 16)),
        max_depth: 2,
        max_pages: 5,
    };
    create_router(Arc::new(state))
}

fn app() -> Router {
    app_with(Arc::new(FakeAnswerer))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    r#"<html><head><title>Home</title></head><body>
                    <main>Welcome to the test site.</main>
                    <a href="/about">About</a><a href="/missing">Missing</a>
                    </body></html>"#,
                    "text/html",
                ),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    "<html><head><title>About</title></head><main>About us.</main></html>",
                    "text/html",
                ),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_chat_answers_from_crawled_pages() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let (status, body) = send(
        app(),
        post_json(
            "/api/chat",
            json!({ "urls": [format!("{}/", server.uri())], "question": "What is this site?" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Answered from 2 sources.");
    assert_eq!(body["sources"].as_array().unwrap().len(), 2);
    assert_eq!(body["sources"][0]["index"], 1);
    assert_eq!(body["sources"][0]["title"], "Home");
    assert_eq!(body["failures"].as_array().unwrap().len(), 1);
    assert_eq!(body["failures"][0]["error"], "HTTP 404");
}

#[tokio::test]
async fn test_chat_requires_urls_and_question() {
    let (status, body) = send(
        app(),
        post_json("/api/chat", json!({ "urls": [], "question": "Why?" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing URLs or question.");

    let (status, _) = send(
        app(),
        post_json(
            "/api/chat",
            json!({ "urls": ["https://example.com/"], "question": "  " }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_rejects_invalid_seed() {
    let (status, body) = send(
        app(),
        post_json(
            "/api/chat",
            json!({ "urls": ["ftp://example.com/file"], "question": "What?" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid seed URL"));
}

#[tokio::test]
async fn test_chat_all_pages_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (status, body) = send(
        app(),
        post_json(
            "/api/chat",
            json!({ "urls": [format!("{}/", server.uri())], "question": "Anything?" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Failed to scrape any content.");
}

#[tokio::test]
async fn test_chat_upstream_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let (status, body) = send(
        app_with(Arc::new(FailingAnswerer)),
        post_json(
            "/api/chat",
            json!({ "urls": [format!("{}/", server.uri())], "question": "What?" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_save_and_load_conversation() {
    let app = app();
    let messages = json!([
        { "role": "user", "content": "What is this?" },
        { "role": "assistant", "content": "A test site." }
    ]);

    let (status, body) = send(app.clone(), post_json("/api/save_chat", messages.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().expect("id").to_string();
    assert_eq!(id.chars().count(), 8);

    let request = Request::builder()
        .uri(format!("/api/save_chat?id={}", id))
        .body(Body::empty())
        .expect("valid request");
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"], messages);
}

#[tokio::test]
async fn test_load_unknown_conversation() {
    for uri in ["/api/save_chat?id=nope1234", "/api/save_chat"] {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request");
        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Conversation not found.");
    }
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let request = Request::builder()
        .uri("/api/save_chat?id=whatever")
        .header(header::ORIGIN, "https://frontend.example")
        .body(Body::empty())
        .expect("valid request");
    let response = app().oneshot(request).await.expect("router is infallible");

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
