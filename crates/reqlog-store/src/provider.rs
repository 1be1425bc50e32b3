//! Store manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use reqlog_core::config::environment::Environment;
use reqlog_core::config::store::StoreConfig;
use reqlog_core::error::LogError;
use reqlog_core::result::LogResult;
use reqlog_core::traits::store::LogStore;

/// Store manager that wraps the configured store provider.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// The inner store provider.
    inner: Arc<dyn LogStore>,
}

impl StoreManager {
    /// Create a new store manager from configuration.
    pub async fn new(config: &StoreConfig, environment: Environment) -> LogResult<Self> {
        let inner: Arc<dyn LogStore> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis store provider");
                let client = crate::redis::RedisClient::connect(&config.redis, environment).await?;
                Arc::new(crate::redis::RedisLogStore::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory store provider");
                Arc::new(crate::memory::MemoryLogStore::new())
            }
            other => {
                return Err(LogError::configuration(format!(
                    "Unknown store provider: '{other}'. Supported: redis, memory"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a store manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn LogStore>) -> Self {
        Self { inner: provider }
    }

    /// Get a reference to the inner provider.
    pub fn provider(&self) -> &dyn LogStore {
        self.inner.as_ref()
    }
}

#[async_trait]
impl LogStore for StoreManager {
    async fn incr(&self, key: &str) -> LogResult<i64> {
        self.inner.incr(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> LogResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> LogResult<()> {
        self.inner.delete(key).await
    }

    async fn get(&self, key: &str) -> LogResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn health_check(&self) -> LogResult<bool> {
        self.inner.health_check().await
    }
}
