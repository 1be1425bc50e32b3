//! # reqlog-store
//!
//! Store backends for reqlog. Supports two providers:
//!
//! - **redis**: Redis-backed storage using the [redis](https://crates.io/crates/redis) crate
//! - **memory**: In-process storage, used by tests and storeless local runs
//!
//! The provider is selected at runtime based on configuration. The
//! [`StoreHandle`](handle::StoreHandle) wraps the selected provider with a
//! lazily-opened connection and a circuit breaker that suppresses store
//! access for a cooldown window after a connection-level outage.

pub mod breaker;
pub mod handle;
pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use handle::StoreHandle;
pub use keys::KeyBuilder;
pub use provider::StoreManager;
