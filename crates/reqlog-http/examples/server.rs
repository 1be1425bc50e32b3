//! Demo server wiring the recorder middleware into an axum app.
//!
//! Runs against the in-memory store so no Redis is needed:
//!
//! ```sh
//! cargo run --example server
//! curl localhost:3000/
//! curl localhost:3000/slow
//! curl localhost:3000/fail
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tracing_subscriber::{EnvFilter, fmt};

use reqlog_core::config::RecorderConfig;
use reqlog_http::middleware::record_requests;
use reqlog_http::recorder::{RequestLog, RequestRecorder};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let mut config = RecorderConfig::for_project("demo");
    config.store.provider = "memory".to_string();

    let recorder = match RequestRecorder::new(config) {
        Ok(recorder) => Arc::new(recorder),
        Err(e) => {
            eprintln!("Failed to build recorder: {e}");
            std::process::exit(1);
        }
    };

    let app = Router::new()
        .route("/", get(hello))
        .route("/slow", get(slow))
        .route("/fail", get(fail))
        .route("/health", get(health))
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&recorder),
            record_requests,
        ));

    let addr = "127.0.0.1:3000";
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("Demo server listening on {addr}");
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

async fn hello(Extension(log): Extension<RequestLog>) -> &'static str {
    log.with_info(|info| {
        info.extra
            .insert("user".to_string(), serde_json::json!("demo-user"));
    });
    "hello"
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(6)).await;
    "that took a while"
}

async fn fail(Extension(log): Extension<RequestLog>) -> StatusCode {
    log.with_info(|info| info.set_error("downstream dependency exploded"));
    StatusCode::BAD_GATEWAY
}

async fn health(Extension(log): Extension<RequestLog>) -> &'static str {
    log.ignore();
    "ok"
}
