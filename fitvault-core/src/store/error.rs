//! Record store error types.

use thiserror::Error;

/// Errors that can occur during record store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing medium could not be opened or used.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A value could not be encoded to or decoded from JSON.
    #[error("Serialization error for {store}/{key}: {source}")]
    Serialization {
        store: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A partition or key name is empty or would escape its partition.
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl StoreError {
    pub(crate) fn unavailable(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        StoreError::StorageUnavailable(format!("{}: {}", context, err))
    }

    /// Returns true if the backing medium itself failed.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::StorageUnavailable(_))
    }
}

/// Rejects names that are empty or could traverse out of a partition.
pub(crate) fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.')
    {
        return Err(StoreError::InvalidKey(name.to_string()));
    }
    Ok(())
}
