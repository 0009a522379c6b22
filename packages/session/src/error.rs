use thiserror::Error;

use crate::auth::ProviderError;

/// Why a linked handle was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a username is required")]
    Empty,

    #[error("usernames are at most {max} characters, got {len}")]
    TooLong { len: usize, max: usize },

    #[error("usernames may only contain letters, digits and single hyphens between them")]
    Malformed,
}

/// Errors reported by [`crate::SessionManager`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The identity's email is outside the allowed organization domain. The
    /// provider session has already been signed out.
    #[error("access is restricted to @{allowed} accounts, got @{domain}")]
    DomainRestricted { domain: String, allowed: String },

    #[error("sign-in was cancelled")]
    SignInCancelled,

    #[error("network error during sign-in: {0}")]
    ProviderNetwork(String),

    #[error("too many sign-in attempts")]
    ProviderRateLimit,

    #[error("sign-in failed: {0}")]
    Provider(String),

    #[error("invalid linked handle: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to read profile: {0}")]
    ProfileRead(String),

    #[error("failed to write profile: {0}")]
    ProfileWrite(String),
}

impl AuthError {
    /// Transient failures worth retrying once the user has waited a moment.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderNetwork(_) | Self::ProviderRateLimit)
    }
}

impl From<ProviderError> for AuthError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Cancelled => Self::SignInCancelled,
            ProviderError::Network(message) => Self::ProviderNetwork(message),
            ProviderError::RateLimited => Self::ProviderRateLimit,
            ProviderError::Other { code, message } => Self::Provider(format!("{code}: {message}")),
        }
    }
}
