//! Toasts for authentication outcomes.

use session::{AuthError, Identity, ProviderKind, Session};

use crate::notifications::{NotificationCenter, NotificationId};

/// Routes [`session::SessionManager`] results to a [`NotificationCenter`].
#[derive(Clone, Default)]
pub struct AuthFeedback {
    center: NotificationCenter,
}

impl AuthFeedback {
    pub fn new(center: NotificationCenter) -> Self {
        Self { center }
    }

    pub fn center(&self) -> &NotificationCenter {
        &self.center
    }

    pub fn signing_in(&self, provider: ProviderKind) -> NotificationId {
        self.center.notify_info(
            format!("Signing in with {}...", provider.label()),
            Some("Authentication"),
            None,
        )
    }

    pub fn welcome(&self, identity: &Identity) -> NotificationId {
        self.center.notify_success(
            format!("Welcome back, {}!", identity.display_name()),
            Some("Authentication Successful"),
            None,
        )
    }

    /// Welcome on success, the matching error toast otherwise. Settled states
    /// other than `Authenticated` produce nothing.
    pub fn sign_in_result(&self, result: &Result<Session, AuthError>) -> Option<NotificationId> {
        match result {
            Ok(Session::Authenticated(identity)) => Some(self.welcome(identity)),
            Ok(_) => None,
            Err(err) => self.auth_error(err),
        }
    }

    /// Returns `None` for validation errors, which belong next to the form field.
    pub fn auth_error(&self, err: &AuthError) -> Option<NotificationId> {
        let center = &self.center;
        let id = match err {
            AuthError::DomainRestricted { allowed, .. } => center.notify_error(
                format!("Access is restricted to @{allowed} email addresses only."),
                Some("Domain Restriction"),
                None,
            ),
            AuthError::SignInCancelled => center.notify_info(
                "Sign in was cancelled. Please try again.",
                Some("Sign In Cancelled"),
                None,
            ),
            AuthError::ProviderNetwork(_) => center.notify_error(
                "Network error. Please check your internet connection.",
                Some("Network Error"),
                None,
            ),
            AuthError::ProviderRateLimit => center.notify_warning(
                "Too many failed attempts. Please try again later.",
                Some("Too Many Attempts"),
                None,
            ),
            AuthError::Provider(_) => center.notify_error(
                "An unexpected error occurred during sign in.",
                Some("Sign In Failed"),
                None,
            ),
            AuthError::ProfileRead(_) => {
                center.notify_error("Failed to load user profile", Some("Profile Error"), None)
            }
            AuthError::ProfileWrite(_) => center.notify_error(
                "Failed to save GitHub username. Please try again.",
                Some("Save Error"),
                None,
            ),
            AuthError::Validation(_) => return None,
        };
        Some(id)
    }

    pub fn signed_out(&self) -> NotificationId {
        self.center.notify_success(
            "You have been signed out successfully.",
            Some("Sign Out"),
            None,
        )
    }

    pub fn handle_linked(&self, handle: &str) -> NotificationId {
        self.center.notify_success(
            format!("GitHub username \"{handle}\" connected successfully!"),
            Some("GitHub Connected"),
            None,
        )
    }
}
