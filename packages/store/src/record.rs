//! # Record store boundary
//!
//! A document store keyed by `(collection, id)`. Records are JSON objects so the
//! same profile document can live in a hosted document database, a relational
//! table behind a thin adapter, or the in-memory [`crate::MemoryStore`].
//!
//! | Method | Semantics |
//! |--------|-----------|
//! | [`get`](RecordStore::get) | `Ok(None)` when the record does not exist. |
//! | [`upsert`](RecordStore::upsert) | Replaces the record, or overlays fields on it when [`WriteOptions::merge`] is set. Creates it when absent. |
//! | [`update`](RecordStore::update) | Overlays fields on an existing record. Fails with [`StoreError::NotFound`] when absent. |

use std::future::Future;

use serde_json::{Map, Value};

use crate::error::StoreError;

/// A stored document: field name to JSON value.
pub type Record = Map<String, Value>;

/// Options for [`RecordStore::upsert`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Keep fields of an existing record that are not present in the write.
    pub merge: bool,
}

impl WriteOptions {
    pub fn merge() -> Self {
        Self { merge: true }
    }

    pub fn replace() -> Self {
        Self { merge: false }
    }
}

/// Async trait for reading and writing records.
pub trait RecordStore: Send + Sync + 'static {
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Record>, StoreError>> + Send;

    fn upsert(
        &self,
        collection: &str,
        id: &str,
        fields: Record,
        options: WriteOptions,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Record,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Overlay `fields` onto `target`, field by field.
pub fn merge_into(target: &mut Record, fields: Record) {
    for (key, value) in fields {
        target.insert(key, value);
    }
}
