//! Lazily-connected store handle with outage suppression.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;

use reqlog_core::config::environment::Environment;
use reqlog_core::config::store::StoreConfig;
use reqlog_core::error::LogError;
use reqlog_core::result::LogResult;
use reqlog_core::traits::store::LogStore;

use crate::breaker::CircuitBreaker;
use crate::provider::StoreManager;

/// An explicitly owned store connection handle.
///
/// The connection is opened on first use and cached for the lifetime of
/// the handle; all concurrent requests share it. Construction never
/// touches the network, so a recorder can be built while the store is
/// down; requests simply go unlogged until it comes back.
///
/// Every operation is routed through a [`CircuitBreaker`]: after a
/// connection-level outage, calls fail fast for one cooldown window
/// instead of re-attempting the network round-trip.
#[derive(Debug)]
pub struct StoreHandle {
    /// Store configuration, used for the lazy connect.
    config: StoreConfig,
    /// Runtime environment (selects the endpoint for development runs).
    environment: Environment,
    /// Lazily-initialized provider.
    store: OnceCell<StoreManager>,
    /// Outage suppression.
    breaker: CircuitBreaker,
}

impl StoreHandle {
    /// Create a handle that connects lazily from configuration.
    pub fn new(config: StoreConfig, environment: Environment) -> Self {
        let cooldown = Duration::from_secs(config.breaker_cooldown_seconds);
        Self {
            config,
            environment,
            store: OnceCell::new(),
            breaker: CircuitBreaker::new(cooldown),
        }
    }

    /// Create a handle over an existing provider (for testing).
    pub fn from_store(provider: Arc<dyn LogStore>) -> Self {
        let config = StoreConfig::default();
        let cooldown = Duration::from_secs(config.breaker_cooldown_seconds);
        Self {
            config,
            environment: Environment::Other,
            store: OnceCell::new_with(Some(StoreManager::from_provider(provider))),
            breaker: CircuitBreaker::new(cooldown),
        }
    }

    /// Atomically increment a counter key.
    pub async fn incr(&self, key: &str) -> LogResult<i64> {
        if self.breaker.is_open() {
            return Err(suppressed());
        }
        let result = match self.store().await {
            Ok(store) => store.incr(key).await,
            Err(e) => Err(e),
        };
        self.track(result)
    }

    /// Set a value with a TTL.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> LogResult<()> {
        if self.breaker.is_open() {
            return Err(suppressed());
        }
        let result = match self.store().await {
            Ok(store) => store.set(key, value, ttl).await,
            Err(e) => Err(e),
        };
        self.track(result)
    }

    /// Delete a key.
    pub async fn delete(&self, key: &str) -> LogResult<()> {
        if self.breaker.is_open() {
            return Err(suppressed());
        }
        let result = match self.store().await {
            Ok(store) => store.delete(key).await,
            Err(e) => Err(e),
        };
        self.track(result)
    }

    /// Get a value by key.
    pub async fn get(&self, key: &str) -> LogResult<Option<String>> {
        if self.breaker.is_open() {
            return Err(suppressed());
        }
        let result = match self.store().await {
            Ok(store) => store.get(key).await,
            Err(e) => Err(e),
        };
        self.track(result)
    }

    /// The lazily-initialized provider; connects on first call.
    async fn store(&self) -> LogResult<&StoreManager> {
        self.store
            .get_or_try_init(|| StoreManager::new(&self.config, self.environment))
            .await
    }

    /// Update the breaker from an operation outcome.
    fn track<T>(&self, result: LogResult<T>) -> LogResult<T> {
        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(e) if e.is_store_unavailable() => self.breaker.trip(),
            Err(_) => {}
        }
        result
    }
}

fn suppressed() -> LogError {
    LogError::store_unavailable("Store access suppressed during outage cooldown")
}
