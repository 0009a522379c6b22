//! # Session crate: authenticated-identity lifecycle for the leaderboard
//!
//! The [`SessionManager`] owns everything between "the user clicked sign in" and
//! "the dashboard shows their row": the provider flow, the organization
//! allow-list, the profile document and sign-out cleanup.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | [`IdentityProvider`] boundary, [`ProviderConfig`] (OAuth endpoints), [`AllowList`], handle validation, [`SessionManager`] |
//! | [`models`] | [`Identity`], [`Session`], [`Profile`] |
//! | [`error`] | [`AuthError`] and [`ValidationError`] |
//! | [`settings`] | Layered [`Settings`] (defaults, `config.toml`, environment) |
//!
//! The record store boundary lives in the `store` crate and is re-exported here
//! for convenience.

pub mod auth;
pub mod error;
pub mod models;
pub mod settings;

pub use auth::{
    validate_handle, AllowList, IdentityProvider, ProviderConfig, ProviderError, ProviderKind,
    ProviderListener, ProviderSubscription, SessionManager, SessionSubscription,
};
pub use error::{AuthError, ValidationError};
pub use models::{Identity, Profile, Session, SessionStatus};
pub use settings::Settings;
pub use store::{LocalCache, RecordStore, StoreError};
