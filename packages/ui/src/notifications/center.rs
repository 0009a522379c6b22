use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use super::message::{Notice, NotificationId, NotificationMessage, Severity, Ttl};
use super::timer::ExpiryTimer;

type QueueCallback = Arc<dyn Fn(&[NotificationMessage]) + Send + Sync>;

struct Entry {
    message: NotificationMessage,
    timer: ExpiryTimer,
}

#[derive(Default)]
struct Shared {
    next_seq: AtomicU64,
    next_listener: AtomicU64,
    queue: Mutex<Vec<Entry>>,
    listeners: Mutex<Vec<(u64, QueueCallback)>>,
}

impl Shared {
    fn snapshot(&self) -> Vec<NotificationMessage> {
        self.queue
            .lock()
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }

    /// Remove `id` from the queue, running `finish` on its timer.
    fn remove(&self, id: NotificationId, finish: fn(&mut ExpiryTimer)) -> bool {
        let removed = {
            let mut queue = self.queue.lock();
            queue
                .iter()
                .position(|entry| entry.message.id == id)
                .map(|index| queue.remove(index))
        };
        let Some(mut entry) = removed else {
            return false;
        };
        finish(&mut entry.timer);
        self.broadcast();
        true
    }

    fn broadcast(&self) {
        let snapshot = self.snapshot();
        let listeners: Vec<QueueCallback> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

/// Ordered queue of toasts, each with its own expiry timer.
///
/// Clones share the same queue. Expiry needs a tokio runtime with the time
/// driver enabled; without one, messages stay until dismissed.
#[derive(Clone, Default)]
pub struct NotificationCenter {
    shared: Arc<Shared>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and arm its timer. Newest messages go last.
    pub fn enqueue(&self, notice: Notice) -> NotificationId {
        let seq = self.shared.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = NotificationId::new(seq);
        let message = notice.into_message(id);
        debug!(%id, severity = message.severity.as_str(), "enqueue notification");

        {
            let mut queue = self.shared.queue.lock();
            let timer = match message.ttl.duration() {
                Some(delay) => {
                    let shared = Arc::downgrade(&self.shared);
                    ExpiryTimer::arm(delay, move || expire(&shared, id))
                }
                None => ExpiryTimer::default(),
            };
            queue.push(Entry { message, timer });
        }
        self.shared.broadcast();
        id
    }

    /// Remove a message and cancel its timer. Returns `false` if it was
    /// already gone.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let removed = self.shared.remove(id, ExpiryTimer::cancel);
        if removed {
            debug!(%id, "dismissed notification");
        }
        removed
    }

    pub fn list(&self) -> Vec<NotificationMessage> {
        self.shared.snapshot()
    }

    pub fn len(&self) -> usize {
        self.shared.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver the queue to `callback` now and after every change.
    pub fn subscribe<F>(&self, callback: F) -> QueueSubscription
    where
        F: Fn(&[NotificationMessage]) + Send + Sync + 'static,
    {
        let callback: QueueCallback = Arc::new(callback);
        let id = self.shared.next_listener.fetch_add(1, Ordering::Relaxed);
        self.shared.listeners.lock().push((id, callback.clone()));
        callback(&self.shared.snapshot());
        QueueSubscription {
            shared: Arc::downgrade(&self.shared),
            id,
        }
    }

    pub fn notify_success(
        &self,
        body: impl Into<String>,
        title: Option<&str>,
        ttl: Option<Ttl>,
    ) -> NotificationId {
        self.notify(Severity::Success, body.into(), title, ttl)
    }

    pub fn notify_warning(
        &self,
        body: impl Into<String>,
        title: Option<&str>,
        ttl: Option<Ttl>,
    ) -> NotificationId {
        self.notify(Severity::Warning, body.into(), title, ttl)
    }

    pub fn notify_info(
        &self,
        body: impl Into<String>,
        title: Option<&str>,
        ttl: Option<Ttl>,
    ) -> NotificationId {
        self.notify(Severity::Info, body.into(), title, ttl)
    }

    pub fn notify_error(
        &self,
        body: impl Into<String>,
        title: Option<&str>,
        ttl: Option<Ttl>,
    ) -> NotificationId {
        self.notify(Severity::Error, body.into(), title, ttl)
    }

    fn notify(
        &self,
        severity: Severity,
        body: String,
        title: Option<&str>,
        ttl: Option<Ttl>,
    ) -> NotificationId {
        let title = title.unwrap_or(severity.default_title());
        let mut notice = Notice::new(severity, body).title(title);
        notice.ttl = ttl;
        self.enqueue(notice)
    }
}

fn expire(shared: &Weak<Shared>, id: NotificationId) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    if shared.remove(id, ExpiryTimer::disarm) {
        debug!(%id, "notification expired");
    }
}

/// Handle returned by [`NotificationCenter::subscribe`]. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct QueueSubscription {
    shared: Weak<Shared>,
    id: u64,
}

impl QueueSubscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for QueueSubscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.listeners.lock().retain(|(lid, _)| *lid != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    async fn elapse(ms: u64) {
        tokio::time::advance(Duration::from_millis(ms)).await;
        settle().await;
    }

    fn bodies(center: &NotificationCenter) -> Vec<String> {
        center.list().into_iter().map(|message| message.body).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_keeps_insertion_order() {
        let center = NotificationCenter::new();
        let ids: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|body| center.enqueue(Notice::info(body)))
            .collect();
        assert_eq!(bodies(&center), ["a", "b", "c", "d"]);

        assert!(center.dismiss(ids[2]));
        assert_eq!(bodies(&center), ["a", "b", "d"]);
        assert!(center.dismiss(ids[0]));
        assert_eq!(bodies(&center), ["b", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_defaults() {
        let center = NotificationCenter::new();
        center.enqueue(Notice::success("ok"));

        let list = center.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].ttl, Ttl::millis(3000));
        assert_eq!(list[0].severity, Severity::Success);

        elapse(3000).await;
        assert!(center.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_exactly_at_ttl() {
        let center = NotificationCenter::new();
        center.enqueue(Notice::warning("slow").ttl(Ttl::millis(3000)));

        elapse(2999).await;
        assert_eq!(center.len(), 1);
        elapse(1).await;
        assert_eq!(center.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_are_independent() {
        let center = NotificationCenter::new();
        center.notify_error("e", None, None);
        center.notify_success("s", None, None);
        center.notify_info("i", None, None);

        elapse(3000).await;
        assert_eq!(bodies(&center), ["e", "i"]);
        elapse(1000).await;
        assert_eq!(bodies(&center), ["e"]);
        elapse(1000).await;
        assert!(center.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_expires() {
        let center = NotificationCenter::new();
        let id = center.notify_warning("pinned", Some("Heads up"), Some(Ttl::Never));

        elapse(60_000).await;
        assert_eq!(center.len(), 1);
        assert!(center.dismiss(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_behaves_like_never() {
        let center = NotificationCenter::new();
        let id = center.enqueue(Notice::info("forever").ttl(Ttl::After(Duration::MAX)));

        elapse(60_000).await;
        assert_eq!(center.list()[0].ttl, Ttl::After(Duration::MAX));
        assert!(center.dismiss(id));
        assert!(center.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_after_expiry_is_a_no_op() {
        let center = NotificationCenter::new();
        let id = center.enqueue(Notice::success("gone soon"));

        elapse(3000).await;
        assert!(!center.dismiss(id));
        assert!(!center.dismiss(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_timer() {
        let center = NotificationCenter::new();
        let first = center.enqueue(Notice::success("first"));
        assert!(center.dismiss(first));

        let changes = Arc::new(Mutex::new(0usize));
        let counter = changes.clone();
        let _sub = center.subscribe(move |_| *counter.lock() += 1);

        elapse(5000).await;
        // Only the delivery on subscribe; the cancelled timer never fired.
        assert_eq!(*changes.lock(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_titles() {
        let center = NotificationCenter::new();
        center.notify_success("a", None, None);
        center.notify_warning("b", None, None);
        center.notify_info("c", None, None);
        center.notify_error("d", Some("Custom"), None);

        let titles: Vec<_> = center.list().into_iter().map(|m| m.title).collect();
        assert_eq!(
            titles,
            [
                Some("Success".to_string()),
                Some("Warning".to_string()),
                Some("Info".to_string()),
                Some("Custom".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_are_unique() {
        let center = NotificationCenter::new();
        let ids: HashSet<_> = (0..500)
            .map(|i| center.enqueue(Notice::info(i.to_string())))
            .collect();
        assert_eq!(ids.len(), 500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_delivers_snapshots() {
        let center = NotificationCenter::new();
        center.enqueue(Notice::info("before"));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = center.subscribe(move |queue| sink.lock().push(queue.len()));
        assert_eq!(*seen.lock(), [1]);

        let id = center.enqueue(Notice::info("after"));
        center.dismiss(id);
        elapse(4000).await;
        assert_eq!(*seen.lock(), [1, 2, 1, 0]);

        sub.unsubscribe();
        center.enqueue(Notice::info("unseen"));
        assert_eq!(seen.lock().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_the_queue() {
        let center = NotificationCenter::new();
        let other = center.clone();
        let id = other.notify_info("shared", None, None);
        assert_eq!(center.list()[0].id, id);
        assert!(center.dismiss(id));
        assert!(other.is_empty());
    }
}
