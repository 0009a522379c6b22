//! # Club membership profile
//!
//! One [`Profile`] document per identity, stored in the `users` collection of the
//! record store (configurable through [`crate::settings::StoreSettings`]). Field
//! names on the wire are camelCase (`linkedHandle`, `displayName`, `avatarURL`,
//! `isActive`, `createdAt`, `updatedAt`) and timestamps are RFC 3339 strings.
//!
//! `created_at` is written once when the document is created. Every write after
//! that goes through [`next_write_time`], so `updated_at` strictly increases even
//! when the wall clock does not.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use store::{Record, StoreError};

use super::identity::Identity;

pub const FIELD_LINKED_HANDLE: &str = "linkedHandle";
pub const FIELD_DISPLAY_NAME: &str = "displayName";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_AVATAR_URL: &str = "avatarURL";
pub const FIELD_IS_ACTIVE: &str = "isActive";
pub const FIELD_UPDATED_AT: &str = "updatedAt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub linked_handle: Option<String>,
    pub display_name: String,
    pub email: String,
    #[serde(default, rename = "avatarURL")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// A fresh, inactive profile for a first sign-in.
    pub fn for_identity(identity: &Identity, now: DateTime<Utc>) -> Self {
        Self {
            id: identity.id.clone(),
            linked_handle: None,
            display_name: identity.display_name().to_string(),
            email: identity.email.clone(),
            avatar_url: identity.avatar_url.clone(),
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_linked_handle(&self) -> bool {
        self.linked_handle.is_some()
    }

    pub fn from_record(record: Record) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(Value::Object(record))?)
    }

    pub fn to_record(&self) -> Result<Record, StoreError> {
        match serde_json::to_value(self)? {
            Value::Object(record) => Ok(record),
            other => Err(StoreError::Serialization(format!(
                "profile serialized to {other}, expected an object"
            ))),
        }
    }
}

/// Timestamp for a write that follows one stamped `previous`.
pub fn next_write_time(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + TimeDelta::milliseconds(1)
    }
}

pub(crate) fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_uses_camel_case_fields() {
        let now = Utc::now();
        let identity = Identity::new("uid-1", "alex@sst.scaler.com")
            .with_name("Alex")
            .with_avatar_url("https://img/alex.png");
        let record = Profile::for_identity(&identity, now).to_record().unwrap();

        assert_eq!(record["id"], "uid-1");
        assert_eq!(record[FIELD_DISPLAY_NAME], "Alex");
        assert_eq!(record[FIELD_AVATAR_URL], "https://img/alex.png");
        assert_eq!(record[FIELD_IS_ACTIVE], false);
        assert!(record[FIELD_LINKED_HANDLE].is_null());
        assert!(record.contains_key("createdAt"));
    }

    #[test]
    fn test_from_record_tolerates_missing_optional_fields() {
        let record = serde_json::json!({
            "id": "uid-2",
            "displayName": "Sam",
            "email": "sam@sst.scaler.com",
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-02T00:00:00Z",
        });
        let profile = Profile::from_record(record.as_object().cloned().unwrap()).unwrap();
        assert_eq!(profile.linked_handle, None);
        assert_eq!(profile.avatar_url, None);
        assert!(!profile.is_active);
    }

    #[test]
    fn test_from_record_rejects_garbage() {
        let record = serde_json::json!({ "id": 7 });
        let err = Profile::from_record(record.as_object().cloned().unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn test_next_write_time_strictly_increases() {
        let future = Utc::now() + TimeDelta::hours(1);
        assert!(next_write_time(future) > future);

        let past = Utc::now() - TimeDelta::hours(1);
        assert!(next_write_time(past) > past);
    }
}
