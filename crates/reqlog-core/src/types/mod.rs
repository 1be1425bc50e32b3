//! Shared types used across the reqlog crates.

pub mod log_type;

pub use log_type::LogType;
