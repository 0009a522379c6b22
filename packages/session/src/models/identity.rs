use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata key under which OAuth providers report the account's username.
pub const METADATA_USER_NAME: &str = "user_name";

/// User record handed back by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    /// Provider-specific fields, passed through untouched.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: None,
            avatar_url: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }

    /// The part of the email after the last `@`, or `""` when there is none.
    pub fn email_domain(&self) -> &str {
        self.email
            .rsplit_once('@')
            .map_or("", |(_, domain)| domain)
    }

    /// Username reported by the provider, if any.
    pub fn provider_username(&self) -> Option<&str> {
        self.metadata.get(METADATA_USER_NAME).and_then(Value::as_str)
    }
}

/// Coarse authentication status for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated,
    Loading,
    Authenticated,
}

/// Current authentication state, owned by [`crate::SessionManager`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    /// The provider has not reported a restored session yet.
    #[default]
    Unknown,
    Anonymous,
    /// A sign-in request is in flight.
    Authenticating,
    Authenticated(Identity),
}

impl Session {
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Unknown | Self::Authenticating => SessionStatus::Loading,
            Self::Anonymous => SessionStatus::Unauthenticated,
            Self::Authenticated(_) => SessionStatus::Authenticated,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}
