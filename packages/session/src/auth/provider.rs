//! # Identity provider boundary
//!
//! [`IdentityProvider`] is the seam between [`crate::SessionManager`] and whatever
//! hosted auth service a deployment uses (a Google popup flow, a GitHub OAuth
//! redirect, ...). Implementations translate their own error codes into
//! [`ProviderError`] through [`ProviderError::from_code`] so nothing upstream ever
//! inspects provider-specific strings.
//!
//! Session change notifications are push based: the provider keeps a list of
//! [`ProviderListener`]s and returns a [`ProviderSubscription`] per listener. The
//! subscription releases the listener when dropped or when
//! [`unsubscribe`](ProviderSubscription::unsubscribe) is called.

use std::fmt;
use std::future::Future;

use thiserror::Error;

use super::config::ProviderConfig;
use crate::models::Identity;

/// Provider failure, already classified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("the user closed the sign-in flow")]
    Cancelled,

    #[error("network request failed: {0}")]
    Network(String),

    #[error("rate limited by the provider")]
    RateLimited,

    #[error("provider error {code}: {message}")]
    Other { code: String, message: String },
}

impl ProviderError {
    /// Classify a raw provider error code.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        match code {
            "auth/popup-closed-by-user"
            | "auth/cancelled-popup-request"
            | "auth/user-cancelled"
            | "access_denied" => Self::Cancelled,
            "auth/network-request-failed" => Self::Network(message.into()),
            "auth/too-many-requests" | "over_request_rate_limit" => Self::RateLimited,
            _ => Self::Other {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }
}

/// Callback invoked with the provider's new session, `None` once signed out.
pub type ProviderListener = Box<dyn Fn(Option<Identity>) + Send + Sync>;

/// Handle to a registered [`ProviderListener`].
#[must_use = "dropping the subscription releases the listener"]
pub struct ProviderSubscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ProviderSubscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ProviderSubscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for ProviderSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSubscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Async interface to an external identity provider.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Run the interactive sign-in flow (popup or redirect).
    fn sign_in(
        &self,
        config: &ProviderConfig,
    ) -> impl Future<Output = Result<Identity, ProviderError>> + Send;

    /// Invalidate the provider-side session.
    fn sign_out(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Load the session the provider persisted from a previous visit.
    fn restore_session(&self)
        -> impl Future<Output = Result<Option<Identity>, ProviderError>> + Send;

    /// The identity the provider currently holds a live session for.
    fn current_identity(&self) -> Option<Identity>;

    fn subscribe_session_changes(&self, listener: ProviderListener) -> ProviderSubscription;
}
