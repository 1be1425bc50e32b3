//! Convenience result type alias for reqlog.

use crate::error::LogError;

/// A specialized `Result` type for reqlog operations.
///
/// This is defined as a convenience so that every crate does not need to
/// write `Result<T, LogError>` explicitly.
pub type LogResult<T> = Result<T, LogError>;
