//! Client-side presentation state shared by every frontend: the toast queue
//! and the glue that turns session outcomes into toasts.

pub mod feedback;
pub mod notifications;

pub use feedback::AuthFeedback;
pub use notifications::{
    Notice, NotificationCenter, NotificationId, NotificationMessage, QueueSubscription, Severity,
    Ttl,
};
