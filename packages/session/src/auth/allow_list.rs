use crate::error::AuthError;
use crate::models::Identity;

/// Restricts sign-in to one organization email domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    domain: String,
}

impl AllowList {
    /// `domain` may be given with or without a leading `@`.
    pub fn new(domain: impl AsRef<str>) -> Self {
        Self {
            domain: domain.as_ref().trim().trim_start_matches('@').to_ascii_lowercase(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn permits(&self, identity: &Identity) -> bool {
        identity.email_domain().eq_ignore_ascii_case(&self.domain)
    }

    pub fn check(&self, identity: &Identity) -> Result<(), AuthError> {
        if self.permits(identity) {
            Ok(())
        } else {
            Err(AuthError::DomainRestricted {
                domain: identity.email_domain().to_ascii_lowercase(),
                allowed: self.domain.clone(),
            })
        }
    }
}
