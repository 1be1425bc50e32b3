//! Runtime environment selection.
//!
//! The environment decides the project namespace suffix and, for local
//! development, redirects the store connection to a local endpoint.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// Deployment environment the recorder runs in.
///
/// Parsed from configuration; unrecognized values fold into
/// [`Environment::Other`], which uses no namespace suffix and the default
/// remote store endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Test runs; namespace suffix `.test`.
    Test,
    /// Production deployments; namespace suffix `.prod`.
    Production,
    /// Developer-local runs; namespace suffix `.dev` and the store
    /// connection is redirected to the local endpoint.
    Development,
    /// Anything else or unset; no suffix, default remote endpoint.
    #[default]
    Other,
}

impl Environment {
    /// Parse an environment string. Never fails: unknown values map to
    /// [`Environment::Other`].
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "test" => Self::Test,
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            _ => Self::Other,
        }
    }

    /// Namespace suffix appended to the project name in store keys.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Test => ".test",
            Self::Production => ".prod",
            Self::Development => ".dev",
            Self::Other => "",
        }
    }

    /// Whether this is a developer-local run (store redirected locally).
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Canonical name for log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Production => "production",
            Self::Development => "development",
            Self::Other => "other",
        }
    }
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

impl Serialize for Environment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_values() {
        assert_eq!(Environment::parse("test"), Environment::Test);
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("prod"), Environment::Production);
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse("dev"), Environment::Development);
        assert_eq!(Environment::parse("DEV"), Environment::Development);
    }

    #[test]
    fn test_parse_unknown_folds_to_other() {
        assert_eq!(Environment::parse("staging"), Environment::Other);
        assert_eq!(Environment::parse(""), Environment::Other);
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(Environment::Test.suffix(), ".test");
        assert_eq!(Environment::Production.suffix(), ".prod");
        assert_eq!(Environment::Development.suffix(), ".dev");
        assert_eq!(Environment::Other.suffix(), "");
    }
}
