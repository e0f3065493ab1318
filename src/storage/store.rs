use anyhow::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Async key-value store for credentials and cached preferences
///
/// Implementations:
/// - `MemoryStore`: process memory only
/// - `FileStore`: JSON document on disk
#[async_trait::async_trait]
pub trait SecureStore: Send + Sync {
    /// Read a value, `None` when the key was never written or was removed
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    async fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }

    /// Read a value, treating empty strings as absent
    async fn get_non_empty(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key).await?.filter(|v| !v.is_empty()))
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `entries`
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

#[async_trait::async_trait]
impl SecureStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
