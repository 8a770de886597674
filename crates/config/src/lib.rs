//! Configuration loading and hot-reloading for the minireq client.
//!
//! Uses figment for YAML-based configuration with sensible defaults and
//! `MINIREQ_` environment overrides, and notify + arc-swap for live file
//! watching.

pub mod schema;
pub mod watcher;

pub use schema::{Config, ENV_PREFIX, Endpoints, LogConfig, StorageKeys};
pub use watcher::ConfigWatcher;
