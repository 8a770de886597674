//! Key-value storage backends for persisting the session.
//!
//! Provides an in-memory store for testing and a SQLite-backed store for production.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStorage;
pub use sqlite::SqliteStorage;
