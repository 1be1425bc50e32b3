//! Record classification types and their storage parameters.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Classification of a request log record.
///
/// A record starts as `Pending` and transitions exactly once to one of the
/// terminal types (`Completed`, `Slow`, `Error`) when the response
/// completes. The type determines both the storage key and the entry's
/// time-to-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    /// The response has not completed yet.
    Pending,
    /// The response completed normally within the slow threshold.
    Completed,
    /// The response completed but took longer than the slow threshold.
    Slow,
    /// The record carries an error set by a handler.
    Error,
}

impl LogType {
    /// One-letter code used in store keys.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pending => "p",
            Self::Completed => "c",
            Self::Slow => "s",
            Self::Error => "e",
        }
    }

    /// Full lowercase name, as used in configuration and log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Slow => "slow",
            Self::Error => "error",
        }
    }

    /// Default time-to-live for entries of this type.
    ///
    /// Completed entries are short-lived; everything that may need human
    /// attention sticks around for ten days.
    pub fn default_ttl(&self) -> Duration {
        const DAY: u64 = 24 * 60 * 60;
        match self {
            Self::Pending => Duration::from_secs(10 * DAY),
            Self::Completed => Duration::from_secs(DAY),
            Self::Slow => Duration::from_secs(10 * DAY),
            Self::Error => Duration::from_secs(10 * DAY),
        }
    }

    /// All types, in lifecycle order.
    pub fn all() -> [LogType; 4] {
        [Self::Pending, Self::Completed, Self::Slow, Self::Error]
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogType {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "slow" => Ok(Self::Slow),
            "error" => Ok(Self::Error),
            other => Err(LogError::configuration(format!(
                "Unknown log type: '{other}'. Supported: pending, completed, slow, error"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(LogType::Pending.code(), "p");
        assert_eq!(LogType::Completed.code(), "c");
        assert_eq!(LogType::Slow.code(), "s");
        assert_eq!(LogType::Error.code(), "e");
    }

    #[test]
    fn test_default_ttls() {
        assert_eq!(LogType::Completed.default_ttl(), Duration::from_secs(86_400));
        assert_eq!(LogType::Pending.default_ttl(), Duration::from_secs(864_000));
        assert_eq!(LogType::Slow.default_ttl(), Duration::from_secs(864_000));
        assert_eq!(LogType::Error.default_ttl(), Duration::from_secs(864_000));
    }

    #[test]
    fn test_from_str_roundtrip() {
        for ty in LogType::all() {
            assert_eq!(ty.as_str().parse::<LogType>().unwrap(), ty);
        }
        assert!("warning".parse::<LogType>().is_err());
    }
}
