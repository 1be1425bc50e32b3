//! Recorder configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate, merged with `REQLOG_`-prefixed environment variables.

pub mod environment;
pub mod store;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use self::environment::Environment;
use self::store::StoreConfig;

use crate::error::LogError;
use crate::types::LogType;

/// Root recorder configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration file and environment overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Project name used to namespace all store keys. Required.
    ///
    /// Must match `^[a-z_\-.\ ]+$` case-insensitively; validated when the
    /// recorder is constructed.
    pub project: String,
    /// Deployment environment; selects the namespace suffix and, for
    /// development, the local store endpoint.
    #[serde(default)]
    pub environment: Environment,
    /// Delay before the initial `pending` write, in milliseconds.
    ///
    /// Requests that complete inside this window never produce a pending
    /// entry at all.
    #[serde(default = "default_pending_delay_ms")]
    pub pending_delay_ms: u64,
    /// Duration threshold for the `slow` classification, in seconds.
    /// `0.0` disables slow detection.
    #[serde(default = "default_slow_time")]
    pub slow_time_seconds: f64,
    /// Maximum number of request-body bytes captured into the record.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Per-type TTL overrides.
    #[serde(default)]
    pub ttl: TtlConfig,
    /// Types the default persistence predicate allows to be written.
    #[serde(default = "default_log_types")]
    pub log_types: Vec<LogType>,
    /// Store backend settings.
    #[serde(default)]
    pub store: StoreConfig,
}

impl RecorderConfig {
    /// Load configuration from a TOML file merged with environment
    /// variables prefixed with `REQLOG_`.
    pub fn load(path: &str) -> Result<Self, LogError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("REQLOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| LogError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| LogError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// A minimal configuration with the given project name and all
    /// defaults. Convenient for embedding the recorder without a config
    /// file.
    pub fn for_project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            environment: Environment::default(),
            pending_delay_ms: default_pending_delay_ms(),
            slow_time_seconds: default_slow_time(),
            max_body_bytes: default_max_body_bytes(),
            ttl: TtlConfig::default(),
            log_types: default_log_types(),
            store: StoreConfig::default(),
        }
    }

    /// The pending-write delay as a [`Duration`].
    pub fn pending_delay(&self) -> Duration {
        Duration::from_millis(self.pending_delay_ms)
    }
}

/// Per-type TTL overrides, in seconds. Unset types use
/// [`LogType::default_ttl`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtlConfig {
    /// Override for `pending` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<u64>,
    /// Override for `completed` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
    /// Override for `slow` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slow: Option<u64>,
    /// Override for `error` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<u64>,
}

impl TtlConfig {
    /// Resolve the TTL for a type: the configured override, else the
    /// type-specific default.
    pub fn for_type(&self, ty: LogType) -> Duration {
        let override_secs = match ty {
            LogType::Pending => self.pending,
            LogType::Completed => self.completed,
            LogType::Slow => self.slow,
            LogType::Error => self.error,
        };
        override_secs.map_or_else(|| ty.default_ttl(), Duration::from_secs)
    }
}

fn default_pending_delay_ms() -> u64 {
    4000
}

fn default_slow_time() -> f64 {
    1.0
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_log_types() -> Vec<LogType> {
    LogType::all().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RecorderConfig::for_project("my-project");
        assert_eq!(config.pending_delay(), Duration::from_millis(4000));
        assert_eq!(config.slow_time_seconds, 1.0);
        assert_eq!(config.max_body_bytes, 65_536);
        assert_eq!(config.log_types.len(), 4);
        assert_eq!(config.store.provider, "redis");
    }

    #[test]
    fn test_ttl_fallback_and_override() {
        let ttl = TtlConfig::default();
        assert_eq!(ttl.for_type(LogType::Completed), Duration::from_secs(86_400));

        let ttl = TtlConfig {
            completed: Some(3600),
            ..TtlConfig::default()
        };
        assert_eq!(ttl.for_type(LogType::Completed), Duration::from_secs(3600));
        assert_eq!(ttl.for_type(LogType::Error), Duration::from_secs(864_000));
    }

    #[test]
    fn test_deserialize_minimal_toml() {
        let config: RecorderConfig = toml_from_str(
            r#"
            project = "shop"
            environment = "prod"

            [ttl]
            error = 1209600
            "#,
        );
        assert_eq!(config.project, "shop");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(
            config.ttl.for_type(LogType::Error),
            Duration::from_secs(1_209_600)
        );
        assert_eq!(config.pending_delay_ms, 4000);
    }

    fn toml_from_str(raw: &str) -> RecorderConfig {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }
}
