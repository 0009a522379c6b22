use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::provider::ProviderSubscription;
use crate::models::Session;

pub(crate) type SessionCallback = Arc<dyn Fn(&Session) + Send + Sync>;

/// Subscribers of one [`crate::SessionManager`], plus the provider listener that
/// lives exactly as long as there is at least one of them.
#[derive(Default)]
pub(crate) struct Hub {
    inner: Mutex<HubInner>,
}

#[derive(Default)]
struct HubInner {
    next_id: u64,
    subscribers: Vec<(u64, SessionCallback)>,
    linked: bool,
    provider_link: Option<ProviderSubscription>,
}

impl Hub {
    /// Register a subscriber. The flag is true when the caller must attach the
    /// provider listener with [`Hub::attach`].
    pub(crate) fn register(&self, callback: SessionCallback) -> (u64, bool) {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, callback));
        let needs_link = !inner.linked;
        inner.linked = true;
        (id, needs_link)
    }

    pub(crate) fn attach(&self, link: ProviderSubscription) {
        let mut inner = self.inner.lock();
        if inner.linked && !inner.subscribers.is_empty() {
            inner.provider_link = Some(link);
        } else {
            // Everyone left before the link was made.
            drop(inner);
            link.unsubscribe();
        }
    }

    fn release(&self, id: u64) {
        let link = {
            let mut inner = self.inner.lock();
            inner.subscribers.retain(|(sid, _)| *sid != id);
            if inner.subscribers.is_empty() {
                inner.linked = false;
                inner.provider_link.take()
            } else {
                None
            }
        };
        if let Some(link) = link {
            tracing::debug!("last session subscriber left, releasing provider listener");
            link.unsubscribe();
        }
    }

    pub(crate) fn callbacks(&self) -> Vec<SessionCallback> {
        self.inner
            .lock()
            .subscribers
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

/// Handle returned by [`crate::SessionManager::subscribe`].
///
/// Call [`unsubscribe`](SessionSubscription::unsubscribe) (or drop the handle) to
/// stop receiving sessions. When the last subscription goes, the manager's
/// listener on the identity provider is released too.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct SessionSubscription {
    hub: Weak<Hub>,
    id: u64,
}

impl SessionSubscription {
    pub(crate) fn new(hub: &Arc<Hub>, id: u64) -> Self {
        Self {
            hub: Arc::downgrade(hub),
            id,
        }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.release(self.id);
        }
    }
}
