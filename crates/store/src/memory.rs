//! In-memory storage backed by a `HashMap` behind a `Mutex`.

use async_trait::async_trait;
use minireq_types::{Result, Storage};
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory [`Storage`] implementation for testing and ephemeral use.
pub struct InMemoryStorage {
    data: Mutex<HashMap<String, String>>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a store pre-populated with the given entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Number of stored keys.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.lock().unwrap().is_empty()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.data.lock().unwrap().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemoryStorage::new();
        store.set("Authorization", "tok-1").await.unwrap();
        assert_eq!(
            store.get("Authorization").await.unwrap().as_deref(),
            Some("tok-1")
        );
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemoryStorage::new();
        assert!(store.get("Authorization").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let store = InMemoryStorage::new();
        store.set("k", "first").await.unwrap();
        store.set("k", "second").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryStorage::with_entries([("a", "1"), ("b", "2")]);
        store.remove("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_clear() {
        let store = InMemoryStorage::with_entries([("a", "1"), ("b", "2")]);
        store.clear().await.unwrap();
        assert!(store.is_empty());
    }
}
