//! Redis store implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use reqlog_core::error::{ErrorKind, LogError};
use reqlog_core::result::LogResult;
use reqlog_core::traits::store::LogStore;

use super::client::RedisClient;

/// Redis-backed log store.
#[derive(Debug, Clone)]
pub struct RedisLogStore {
    /// Redis client.
    client: RedisClient,
}

impl RedisLogStore {
    /// Create a new Redis log store.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to a LogError, distinguishing connection-level
    /// outages so the circuit breaker can react to them.
    fn map_err(e: redis::RedisError) -> LogError {
        let kind = if e.is_connection_refusal()
            || e.is_connection_dropped()
            || e.is_io_error()
            || e.is_timeout()
        {
            ErrorKind::StoreUnavailable
        } else {
            ErrorKind::Store
        };
        LogError::with_source(kind, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl LogStore for RedisLogStore {
    async fn incr(&self, key: &str) -> LogResult<i64> {
        let mut conn = self.client.conn_mut();
        let result: i64 = conn.incr(key, 1i64).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> LogResult<()> {
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .set_ex(key, value, ttl.as_secs())
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> LogResult<()> {
        let mut conn = self.client.conn_mut();
        let _: () = conn.del(key).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> LogResult<Option<String>> {
        let mut conn = self.client.conn_mut();
        let result: Option<String> = conn.get(key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn health_check(&self) -> LogResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}
