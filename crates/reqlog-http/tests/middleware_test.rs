//! Integration tests driving the recorder middleware through an axum
//! router with the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::Extension;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use tower::ServiceExt;

use reqlog_core::config::RecorderConfig;
use reqlog_core::traits::store::LogStore;
use reqlog_http::middleware::record_requests;
use reqlog_http::recorder::{RequestLog, RequestRecorder};
use reqlog_store::memory::MemoryLogStore;

/// Test application context.
struct TestApp {
    /// The axum router for making test requests.
    router: Router,
    /// The store backing the recorder, for direct assertions.
    store: Arc<MemoryLogStore>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryLogStore::new());
        let recorder = Arc::new(
            RequestRecorder::with_store(
                RecorderConfig::for_project("shop"),
                Arc::clone(&store) as Arc<dyn reqlog_core::traits::store::LogStore>,
            )
            .expect("recorder"),
        );

        let router = Router::new()
            .route("/items", get(|| async { "ok" }))
            .route("/orders", post(echo))
            .route("/fail", get(fail))
            .route("/skip", get(skip))
            .layer(axum::middleware::from_fn_with_state(
                recorder,
                record_requests,
            ));

        Self { store, router }
    }

    async fn entry(&self, key: &str) -> Option<serde_json::Value> {
        self.store
            .get(key)
            .await
            .expect("store get")
            .map(|raw| serde_json::from_str(&raw).expect("stored record is JSON"))
    }
}

async fn echo(body: String) -> String {
    body
}

async fn fail(Extension(log): Extension<RequestLog>) -> StatusCode {
    log.with_info(|info| info.set_error("downstream dependency exploded"));
    StatusCode::BAD_GATEWAY
}

async fn skip(Extension(log): Extension<RequestLog>) -> &'static str {
    log.ignore();
    "ok"
}

/// Let the spawned record tasks run to completion on the paused clock.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test(start_paused = true)]
async fn test_get_produces_single_completed_entry() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/items").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    settle().await;

    let entry = app.entry("rLog:shop:c:1").await.expect("completed entry");
    assert_eq!(entry["method"], "GET");
    assert_eq!(entry["url"], "/items");
    assert_eq!(entry["status"], 200);
    assert!(app.entry("rLog:shop:p:1").await.is_none());
    assert_eq!(
        app.store.ttl_of("rLog:shop:c:1"),
        Some(Duration::from_secs(86_400))
    );
}

#[tokio::test(start_paused = true)]
async fn test_options_and_head_pass_through_unlogged() {
    let app = TestApp::new();

    for method in ["OPTIONS", "HEAD"] {
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri("/items")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
    settle().await;

    // No id was ever allocated and nothing was written.
    assert_eq!(app.store.get("rLog:shop:id").await.unwrap(), None);
    assert!(app.store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_body_captured_and_still_delivered() {
    let app = TestApp::new();
    let payload = r#"{"qty":2}"#;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .header("content-length", payload.len())
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The handler saw the body untouched.
    let echoed = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&echoed[..], payload.as_bytes());

    settle().await;
    let entry = app.entry("rLog:shop:c:1").await.expect("completed entry");
    assert_eq!(entry["body"], payload);
}

#[tokio::test(start_paused = true)]
async fn test_handler_error_annotation_yields_error_entry() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/fail").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    settle().await;

    let entry = app.entry("rLog:shop:e:1").await.expect("error entry");
    assert_eq!(entry["error"], "downstream dependency exploded");
    assert_eq!(entry["status"], 502);
    assert!(app.entry("rLog:shop:c:1").await.is_none());
    assert_eq!(
        app.store.ttl_of("rLog:shop:e:1"),
        Some(Duration::from_secs(864_000))
    );
}

#[tokio::test(start_paused = true)]
async fn test_ignore_from_handler_suppresses_all_writes() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/skip").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    settle().await;

    assert!(app.store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_forwarded_for_wins_over_connection_address() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/items")
                .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
                .header("user-agent", "curl/8")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    settle().await;

    let entry = app.entry("rLog:shop:c:1").await.expect("completed entry");
    assert_eq!(entry["ip"], "203.0.113.9");
    assert_eq!(entry["userAgent"], "curl/8");
}
