//! SQLite-backed key-value storage using sqlx.
//!
//! Schema: `kv(key TEXT PRIMARY KEY, value TEXT, updated_at INTEGER)`.

use async_trait::async_trait;
use minireq_types::{Result, Storage};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;

/// A persistent [`Storage`] backed by `SQLite`.
pub struct SqliteStorage {
    /// Connection pool to the `SQLite` database.
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Connects to a `SQLite` database (e.g. `"sqlite:./session.db"` or `"sqlite::memory:"`).
    ///
    /// Automatically creates the database file if it does not exist and
    /// creates the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`sqlx::Error`] if the connection or table creation fails.
    pub async fn new(database_url: &str) -> std::result::Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // A single connection keeps `sqlite::memory:` databases coherent.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Self::migrate(&pool).await?;
        tracing::debug!(url = database_url, "sqlite storage ready");
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv (
                key         TEXT    PRIMARY KEY NOT NULL,
                value       TEXT    NOT NULL,
                updated_at  INTEGER NOT NULL DEFAULT (unixepoch())
            )",
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = unixepoch()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM kv").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteStorage {
        SqliteStorage::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = memory_store().await;
        store.set("Authorization", "tok").await.unwrap();
        assert_eq!(
            store.get("Authorization").await.unwrap().as_deref(),
            Some("tok")
        );
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = memory_store().await;
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert() {
        let store = memory_store().await;
        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let store = memory_store().await;
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.remove("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
        store.clear().await.unwrap();
        assert!(store.get("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("session.db").display());
        {
            let store = SqliteStorage::new(&url).await.unwrap();
            store.set("Account_Info", r#"{"nick":"a"}"#).await.unwrap();
        }
        let store = SqliteStorage::new(&url).await.unwrap();
        assert_eq!(
            store.get("Account_Info").await.unwrap().as_deref(),
            Some(r#"{"nick":"a"}"#)
        );
    }
}
