//! Axum middleware attaching a request log record to each request.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes, to_bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{CONTENT_LENGTH, HeaderMap};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::record::RecordInfo;
use crate::recorder::RequestRecorder;

/// Records the lifecycle of every request except `OPTIONS`/`HEAD`.
///
/// The [`RequestLog`](crate::recorder::RequestLog) handle is inserted into
/// the request extensions (for handlers, via `Extension<RequestLog>`) and
/// into the response extensions (for outer layers). When the inner handler
/// returns, the final write is triggered without delaying the response.
pub async fn record_requests(
    State(recorder): State<Arc<RequestRecorder>>,
    request: Request,
    next: Next,
) -> Response {
    if matches!(*request.method(), Method::OPTIONS | Method::HEAD) {
        return next.run(request).await;
    }

    let (mut request, info) = capture(request, recorder.config().max_body_bytes).await;
    let log = recorder.begin(info);
    request.extensions_mut().insert(log.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(log.clone());

    log.finish(response.status().as_u16());
    response
}

/// Capture the static request attributes, buffering the body when its
/// size is known and within the configured cap.
async fn capture(request: Request, max_body_bytes: usize) -> (Request, RecordInfo) {
    let mut info = RecordInfo::new(
        request.method().as_str(),
        request.uri().to_string(),
        client_ip(&request),
    );
    info.language = header_value(request.headers(), "accept-language");
    info.referer = header_value(request.headers(), "referer");
    info.user_agent = header_value(request.headers(), "user-agent");

    // Buffering an unbounded or oversized body could break the request
    // for downstream handlers, so only declared, small bodies are read.
    let declared_len = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    let request = match declared_len {
        Some(len) if len > 0 && len <= max_body_bytes => {
            let (parts, body) = request.into_parts();
            let bytes = match to_bytes(body, max_body_bytes).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "Failed to buffer request body for logging");
                    Bytes::new()
                }
            };
            info.body = String::from_utf8_lossy(&bytes).into_owned();
            Request::from_parts(parts, Body::from(bytes))
        }
        _ => request,
    };

    (request, info)
}

/// Client IP: the first `X-Forwarded-For` entry when present, else the
/// connection's remote address.
fn client_ip(request: &Request) -> String {
    if let Some(forwarded) = header_value(request.headers(), "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let request = Request::builder()
            .uri("/")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&request), "203.0.113.9");
    }

    #[test]
    fn test_client_ip_falls_back_to_connect_info() {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo::<SocketAddr>("192.0.2.7:4242".parse().unwrap()));
        assert_eq!(client_ip(&request), "192.0.2.7");
    }
}
