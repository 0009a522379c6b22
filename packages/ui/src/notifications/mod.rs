//! Transient toasts: typed, queued in display order, expiring on their own.

mod center;
mod message;
mod timer;

pub use center::{NotificationCenter, QueueSubscription};
pub use message::{Notice, NotificationId, NotificationMessage, Severity, Ttl};
