//! # reqlog-core
//!
//! Core crate for reqlog. Contains configuration schemas, the shared
//! [`LogType`](types::LogType) classification, the [`LogStore`](traits::store::LogStore)
//! trait, and the unified error system.
//!
//! This crate has **no** internal dependencies on other reqlog crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::LogError;
pub use result::LogResult;
pub use types::LogType;
