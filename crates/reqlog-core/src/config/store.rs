//! Store backend configuration.

use serde::{Deserialize, Serialize};

/// Top-level store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store provider type: `"redis"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Cooldown window after a connection-level outage, in seconds.
    /// During the cooldown all store access is suppressed.
    #[serde(default = "default_breaker_cooldown")]
    pub breaker_cooldown_seconds: u64,
    /// Redis-specific configuration.
    #[serde(default)]
    pub redis: RedisStoreConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            breaker_cooldown_seconds: default_breaker_cooldown(),
            redis: RedisStoreConfig::default(),
        }
    }
}

/// Redis store backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    /// Redis connection URL for the default remote endpoint.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Redis connection URL used instead of `url` in developer-local runs.
    #[serde(default = "default_local_url")]
    pub local_url: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            local_url: default_local_url(),
        }
    }
}

fn default_provider() -> String {
    "redis".to_string()
}

fn default_breaker_cooldown() -> u64 {
    300
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_local_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
