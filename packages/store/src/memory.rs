use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::record::{merge_into, Record, RecordStore, WriteOptions};

/// In-memory RecordStore for testing and offline fallback.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, HashMap<String, Record>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .get(collection)
            .map_or(0, HashMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl RecordStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self
            .collections
            .lock()
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        fields: Record,
        options: WriteOptions,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.lock();
        let records = collections.entry(collection.to_string()).or_default();
        match records.get_mut(id) {
            Some(existing) if options.merge => merge_into(existing, fields),
            _ => {
                records.insert(id.to_string(), fields);
            }
        }
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Record) -> Result<(), StoreError> {
        let mut collections = self.collections.lock();
        let existing = collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        merge_into(existing, fields);
        Ok(())
    }
}
