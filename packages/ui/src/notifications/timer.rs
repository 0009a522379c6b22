use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// One-shot task that runs a callback once its delay has elapsed.
///
/// Dropping the timer cancels it. Cancelling twice, or after the callback
/// already ran, does nothing.
#[derive(Debug, Default)]
pub(crate) struct ExpiryTimer {
    task: Option<JoinHandle<()>>,
}

impl ExpiryTimer {
    /// Schedule `on_fire` on the current tokio runtime. Outside a runtime, or
    /// when the deadline is beyond what the clock can represent, the timer is
    /// inert and the callback never runs.
    pub(crate) fn arm<F>(delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(?delay, "no async runtime, notification will not expire");
            return Self::default();
        };
        // Deadline is fixed now, not when the task is first polled.
        let Some(deadline) = Instant::now().checked_add(delay) else {
            tracing::debug!(?delay, "delay out of clock range, notification will not expire");
            return Self::default();
        };
        let task = runtime.spawn(async move {
            sleep_until(deadline).await;
            on_fire();
        });
        Self { task: Some(task) }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Forget the task without aborting it. Used from inside the callback.
    pub(crate) fn disarm(&mut self) {
        self.task.take();
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
