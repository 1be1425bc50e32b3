//! The per-request record payload and its classification rule.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use reqlog_core::types::LogType;

/// The mutable per-request record, serialized to JSON for storage.
///
/// Downstream handlers may annotate it freely: set an [`error`](Self::error),
/// or add arbitrary fields through [`extra`](Self::extra) (flattened into
/// the serialized object).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordInfo {
    /// Request URL (path and query).
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Request body payload, possibly empty.
    pub body: String,
    /// `Accept-Language` header, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Request start, seconds since the Unix epoch.
    pub time: f64,
    /// Client IP: first `X-Forwarded-For` entry, else the connection's
    /// remote address.
    pub ip: String,
    /// `Referer` header, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    /// `User-Agent` header, when present.
    #[serde(rename = "userAgent", default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Response duration in seconds, 3 significant digits. Set at
    /// completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Final HTTP status code. Set at completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Error annotation set by a handler. Presence (non-null) classifies
    /// the record as `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Free-form annotations added by handlers (e.g. a `user` field).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl RecordInfo {
    /// Create a record for a request starting now.
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        ip: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            time: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
            ip: ip.into(),
            ..Self::default()
        }
    }

    /// Annotate the record with a structured error value.
    pub fn set_error_value(&mut self, value: Value) {
        self.error = Some(value);
    }

    /// Annotate the record with an error, stored as its string rendering.
    ///
    /// Use this for error types that do not serialize; the record keeps a
    /// plain string and the final write can never fail on the payload.
    pub fn set_error(&mut self, err: impl std::fmt::Display) {
        self.error = Some(Value::String(err.to_string()));
    }

    /// Whether an error annotation is present (non-null).
    pub fn has_error(&self) -> bool {
        self.error.as_ref().is_some_and(|e| !e.is_null())
    }
}

/// Classify a record from its current state.
///
/// Applied at response completion and on mid-flight `update()` calls:
/// an error annotation wins over everything; otherwise a known duration
/// above the (nonzero) slow threshold makes the record `slow`; otherwise
/// it is `completed`.
pub fn classify(info: &RecordInfo, slow_time_seconds: f64) -> LogType {
    if info.has_error() {
        LogType::Error
    } else if slow_time_seconds > 0.0
        && info.duration.is_some_and(|d| d > slow_time_seconds)
    {
        LogType::Slow
    } else {
        LogType::Completed
    }
}

/// Round to the given number of significant digits.
pub fn round_sig_figs(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits - 1 - magnitude);
    (value * factor).round() / factor
}
