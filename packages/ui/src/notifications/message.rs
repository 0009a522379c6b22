use std::fmt;
use std::time::Duration;

/// Notification category. Picks the icon, the colour and the default lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Warning,
    Info,
    Error,
}

impl Severity {
    pub fn default_ttl(self) -> Ttl {
        let millis = match self {
            Self::Success => 3000,
            Self::Warning | Self::Info => 4000,
            Self::Error => 5000,
        };
        Ttl::After(Duration::from_millis(millis))
    }

    /// Title used by the `notify_*` shortcuts when the caller gives none.
    pub fn default_title(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Warning => "Warning",
            Self::Info => "Info",
            Self::Error => "Error",
        }
    }

    /// CSS class suffix for the toast.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// How long a notification stays up without being dismissed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ttl {
    After(Duration),
    Never,
}

impl Ttl {
    pub fn millis(ms: u64) -> Self {
        Self::After(Duration::from_millis(ms))
    }

    pub fn duration(self) -> Option<Duration> {
        match self {
            Self::After(duration) => Some(duration),
            Self::Never => None,
        }
    }
}

/// Identifier assigned by [`crate::NotificationCenter::enqueue`].
///
/// The sequence number orders ids within one center; the random nonce keeps
/// ids from separate centers from colliding when they end up in the same view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NotificationId {
    seq: u64,
    nonce: u32,
}

impl NotificationId {
    pub(crate) fn new(seq: u64) -> Self {
        Self {
            seq,
            nonce: rand::random(),
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:08x}", self.seq, self.nonce)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NotificationMessage {
    pub id: NotificationId,
    pub severity: Severity,
    pub title: Option<String>,
    pub body: String,
    pub ttl: Ttl,
}

/// A notification waiting to be enqueued.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub severity: Severity,
    pub title: Option<String>,
    pub body: String,
    /// `None` takes the severity's default.
    pub ttl: Option<Ttl>,
}

impl Notice {
    pub fn new(severity: Severity, body: impl Into<String>) -> Self {
        Self {
            severity,
            title: None,
            body: body.into(),
            ttl: None,
        }
    }

    pub fn success(body: impl Into<String>) -> Self {
        Self::new(Severity::Success, body)
    }

    pub fn warning(body: impl Into<String>) -> Self {
        Self::new(Severity::Warning, body)
    }

    pub fn info(body: impl Into<String>) -> Self {
        Self::new(Severity::Info, body)
    }

    pub fn error(body: impl Into<String>) -> Self {
        Self::new(Severity::Error, body)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub(crate) fn into_message(self, id: NotificationId) -> NotificationMessage {
        NotificationMessage {
            id,
            ttl: self.ttl.unwrap_or(self.severity.default_ttl()),
            severity: self.severity,
            title: self.title,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttls() {
        assert_eq!(Severity::Success.default_ttl(), Ttl::millis(3000));
        assert_eq!(Severity::Warning.default_ttl(), Ttl::millis(4000));
        assert_eq!(Severity::Info.default_ttl(), Ttl::millis(4000));
        assert_eq!(Severity::Error.default_ttl(), Ttl::millis(5000));
    }

    #[test]
    fn test_notice_resolves_ttl() {
        let id = NotificationId::new(0);
        let message = Notice::error("boom").into_message(id);
        assert_eq!(message.ttl, Ttl::millis(5000));
        assert_eq!(message.title, None);

        let message = Notice::info("sticky").title("Heads up").ttl(Ttl::Never).into_message(id);
        assert_eq!(message.ttl, Ttl::Never);
        assert_eq!(message.ttl.duration(), None);
        assert_eq!(message.title.as_deref(), Some("Heads up"));
    }

    #[test]
    fn test_id_display() {
        let id = NotificationId { seq: 7, nonce: 0xbeef };
        assert_eq!(id.to_string(), "7-0000beef");
        assert_eq!(id.seq(), 7);
    }
}
