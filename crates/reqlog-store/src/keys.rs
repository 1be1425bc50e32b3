//! Store key builders for all reqlog entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the recorder uses.

use std::sync::LazyLock;

use regex::Regex;

use reqlog_core::config::environment::Environment;
use reqlog_core::error::LogError;
use reqlog_core::result::LogResult;
use reqlog_core::types::LogType;

/// Prefix applied to all reqlog keys.
const PREFIX: &str = "rLog";

/// Allowed project names: letters, underscores, dashes, dots, and spaces.
static PROJECT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z_. -]+$").expect("project name pattern"));

/// Builds the namespaced store keys for one project/environment pair.
///
/// The namespace is fixed at construction: `rLog:<project><suffix>:`, where
/// the suffix comes from the runtime [`Environment`].
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    /// Full key prefix including the trailing colon.
    prefix: String,
}

impl KeyBuilder {
    /// Create a key builder, validating the project name.
    ///
    /// An invalid or empty project name is a fatal configuration error.
    pub fn new(project: &str, environment: Environment) -> LogResult<Self> {
        if !PROJECT_NAME.is_match(project) {
            return Err(LogError::configuration(format!(
                "Invalid project name: '{project}'. Allowed characters: letters, '_', '-', '.', ' '"
            )));
        }
        Ok(Self {
            prefix: format!("{PREFIX}:{project}{}:", environment.suffix()),
        })
    }

    /// The full key prefix, including the trailing colon.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key of the atomic record-ID counter. No expiry.
    pub fn counter(&self) -> String {
        format!("{}id", self.prefix)
    }

    /// Key of a record entry: `<prefix><code>:<id>`.
    pub fn entry(&self, ty: LogType, id: i64) -> String {
        format!("{}{}:{}", self.prefix, ty.code(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_key() {
        let keys = KeyBuilder::new("shop", Environment::Other).unwrap();
        assert_eq!(keys.counter(), "rLog:shop:id");
    }

    #[test]
    fn test_entry_keys() {
        let keys = KeyBuilder::new("shop", Environment::Other).unwrap();
        assert_eq!(keys.entry(LogType::Pending, 7), "rLog:shop:p:7");
        assert_eq!(keys.entry(LogType::Completed, 7), "rLog:shop:c:7");
        assert_eq!(keys.entry(LogType::Slow, 12), "rLog:shop:s:12");
        assert_eq!(keys.entry(LogType::Error, 12), "rLog:shop:e:12");
    }

    #[test]
    fn test_environment_suffixes() {
        let keys = KeyBuilder::new("shop", Environment::Test).unwrap();
        assert_eq!(keys.counter(), "rLog:shop.test:id");
        let keys = KeyBuilder::new("shop", Environment::Production).unwrap();
        assert_eq!(keys.counter(), "rLog:shop.prod:id");
        let keys = KeyBuilder::new("shop", Environment::Development).unwrap();
        assert_eq!(keys.counter(), "rLog:shop.dev:id");
    }

    #[test]
    fn test_project_name_validation() {
        assert!(KeyBuilder::new("My Shop v1", Environment::Other).is_err());
        assert!(KeyBuilder::new("", Environment::Other).is_err());
        assert!(KeyBuilder::new("shop!", Environment::Other).is_err());
        assert!(KeyBuilder::new("My Shop", Environment::Other).is_ok());
        assert!(KeyBuilder::new("shop_v-two.main", Environment::Other).is_ok());
    }
}
