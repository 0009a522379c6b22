//! Client-side persisted data (the browser's local storage on the web build).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StoreError;

/// Synchronous key/value storage local to the client.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    /// Remove every entry.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory LocalCache.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        tracing::debug!(entries = entries.len(), "clearing local cache");
        entries.clear();
        Ok(())
    }
}
