//! Key-value store surface for resume persistence.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// Key-Value Store
// ============================================================================

/// Port for persisting small JSON documents across sessions.
///
/// Hosts typically back this with browser local storage or a settings
/// file. Keys are namespaced by the engine; values are opaque JSON.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value, `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Writes a value; `None` deletes the key.
    async fn set(&self, key: &str, value: Option<Value>) -> Result<()>;
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-memory [`KeyValueStore`].
///
/// Suitable for tests and for embedders that do not want durable resume
/// state. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<FxHashMap<String, Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Option<Value>) -> Result<()> {
        let mut entries = self.entries.lock();
        match value {
            Some(value) => {
                entries.insert(key.to_string(), value);
            }
            None => {
                entries.remove(key);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();

        store
            .set("batch:test", Some(json!({"index": 3})))
            .await
            .unwrap();
        let value = store.get("batch:test").await.unwrap();
        assert_eq!(value, Some(json!({"index": 3})));
    }

    #[tokio::test]
    async fn test_memory_store_missing_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_delete() {
        let store = MemoryStore::new();

        store.set("k", Some(json!(1))).await.unwrap();
        assert_eq!(store.len(), 1);

        store.set("k", None).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_overwrite() {
        let store = MemoryStore::new();

        store.set("k", Some(json!(1))).await.unwrap();
        store.set("k", Some(json!(2))).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!(2)));
    }
}
