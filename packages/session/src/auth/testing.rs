//! In-memory provider and a store with fault injection, for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use store::{MemoryStore, Record, RecordStore, StoreError, WriteOptions};
use tokio::sync::Notify;

use super::config::ProviderConfig;
use super::provider::{IdentityProvider, ProviderError, ProviderListener, ProviderSubscription};
use crate::models::Identity;

type SharedListener = Arc<dyn Fn(Option<Identity>) + Send + Sync>;

#[derive(Default)]
struct ProviderInner {
    outcomes: Mutex<VecDeque<Result<Identity, ProviderError>>>,
    restored: Mutex<Option<Identity>>,
    current: Mutex<Option<Identity>>,
    listeners: Mutex<Vec<(u64, SharedListener)>>,
    next_listener: AtomicU64,
    gate: Mutex<Option<Arc<Notify>>>,
    restore_gate: Mutex<Option<Arc<Notify>>>,
    fail_sign_out: AtomicBool,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

/// Provider whose sign-in outcomes are queued up front.
#[derive(Clone, Default)]
pub(crate) struct ScriptedProvider {
    inner: Arc<ProviderInner>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_outcome(&self, outcome: Result<Identity, ProviderError>) {
        self.inner.outcomes.lock().push_back(outcome);
    }

    pub(crate) fn set_restored(&self, identity: Option<Identity>) {
        *self.inner.restored.lock() = identity;
    }

    /// Hold every sign-in until the returned gate is notified.
    pub(crate) fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.inner.gate.lock() = Some(gate.clone());
        gate
    }

    /// Hold every session restore until the returned gate is notified.
    pub(crate) fn restore_gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.inner.restore_gate.lock() = Some(gate.clone());
        gate
    }

    pub(crate) fn fail_sign_out(&self, fail: bool) {
        self.inner.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Simulate a session change that happened at the provider.
    pub(crate) fn emit(&self, identity: Option<Identity>) {
        *self.inner.current.lock() = identity.clone();
        let listeners: Vec<SharedListener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(identity.clone());
        }
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    pub(crate) fn sign_in_calls(&self) -> usize {
        self.inner.sign_in_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn sign_out_calls(&self) -> usize {
        self.inner.sign_out_calls.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for ScriptedProvider {
    async fn sign_in(&self, _config: &ProviderConfig) -> Result<Identity, ProviderError> {
        self.inner.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.inner.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let outcome = self
            .inner
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or(Err(ProviderError::Cancelled));
        if let Ok(identity) = &outcome {
            self.emit(Some(identity.clone()));
        }
        outcome
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.inner.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_sign_out.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("offline".to_string()));
        }
        self.emit(None);
        Ok(())
    }

    async fn restore_session(&self) -> Result<Option<Identity>, ProviderError> {
        let gate = self.inner.restore_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let restored = self.inner.restored.lock().clone();
        *self.inner.current.lock() = restored.clone();
        Ok(restored)
    }

    fn current_identity(&self) -> Option<Identity> {
        self.inner.current.lock().clone()
    }

    fn subscribe_session_changes(&self, listener: ProviderListener) -> ProviderSubscription {
        let id = self.inner.next_listener.fetch_add(1, Ordering::SeqCst);
        self.inner.listeners.lock().push((id, Arc::from(listener)));
        let inner = Arc::downgrade(&self.inner);
        ProviderSubscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.lock().retain(|(lid, _)| *lid != id);
            }
        })
    }
}

/// MemoryStore that can be told to fail reads or writes.
#[derive(Clone, Default)]
pub(crate) struct FlakyStore {
    pub(crate) inner: MemoryStore,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RecordStore for FlakyStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
        Self::check(&self.fail_reads)?;
        self.inner.get(collection, id).await
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        fields: Record,
        options: WriteOptions,
    ) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.upsert(collection, id, fields, options).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Record) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.update(collection, id, fields).await
    }
}
