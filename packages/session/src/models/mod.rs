//! # Session models
//!
//! - [`Identity`]: the user record returned by the identity provider.
//! - [`Session`] / [`SessionStatus`]: authentication state as seen by subscribers.
//! - [`Profile`]: the persisted club-membership document keyed by identity id.

mod identity;
mod profile;

pub use identity::{Identity, Session, SessionStatus, METADATA_USER_NAME};
pub use profile::{next_write_time, Profile};
pub(crate) use profile::{
    timestamp_value, FIELD_AVATAR_URL, FIELD_DISPLAY_NAME, FIELD_EMAIL, FIELD_IS_ACTIVE,
    FIELD_LINKED_HANDLE, FIELD_UPDATED_AT,
};
