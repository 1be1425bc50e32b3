//! Store trait for pluggable key-value backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::LogResult;

/// Trait for log-entry storage backends (Redis or in-memory).
///
/// All values are serialized as strings (JSON). Key namespacing is the
/// caller's concern; the backend stores keys verbatim.
#[async_trait]
pub trait LogStore: Send + Sync + std::fmt::Debug + 'static {
    /// Atomically increment an integer value by 1 and return the new
    /// value. The counter starts at 1 on first use and persists for as
    /// long as the store does.
    async fn incr(&self, key: &str) -> LogResult<i64>;

    /// Set a value with a TTL (SETEX semantics).
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> LogResult<()>;

    /// Delete a key.
    async fn delete(&self, key: &str) -> LogResult<()>;

    /// Get a value by key. Returns `None` if the key does not exist or has
    /// expired.
    async fn get(&self, key: &str) -> LogResult<Option<String>>;

    /// Check that the store backend is reachable.
    async fn health_check(&self) -> LogResult<bool>;
}
