//! # reqlog-http
//!
//! Request lifecycle recording middleware for axum.
//!
//! Each non-`OPTIONS`/`HEAD` request gets a [`RequestLog`](recorder::RequestLog)
//! handle attached to its request and response extensions. The record is
//! written to the store as `pending` if the response outlives a configured
//! delay, then rewritten under its terminal classification (`completed`,
//! `slow`, or `error`) when the response completes, deleting the stale
//! key if the classification changed.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use axum::{Router, routing::get};
//! use reqlog_core::config::RecorderConfig;
//! use reqlog_http::middleware::record_requests;
//! use reqlog_http::recorder::RequestRecorder;
//!
//! # async fn run() -> reqlog_core::LogResult<()> {
//! let recorder = Arc::new(RequestRecorder::new(RecorderConfig::for_project("shop"))?);
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .layer(axum::middleware::from_fn_with_state(
//!         Arc::clone(&recorder),
//!         record_requests,
//!     ));
//! # Ok(())
//! # }
//! ```

pub mod middleware;
pub mod record;
pub mod recorder;

pub use record::RecordInfo;
pub use recorder::{RequestLog, RequestRecorder};
