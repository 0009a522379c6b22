use thiserror::Error;

/// Failure reported by a [`crate::RecordStore`] or [`crate::LocalCache`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Network failure or backend outage.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
