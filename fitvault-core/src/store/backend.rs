//! The contract a persistence medium has to satisfy.

use async_trait::async_trait;

use super::StoreError;

/// Asynchronous string storage addressed by `(store, key)`.
///
/// Backends deal in already-encoded JSON text; encoding and per-key write
/// ordering live in [`RecordStore`](super::RecordStore).
#[async_trait]
pub trait Backend: Send + Sync {
    /// Returns the stored text, or `None` if the key was never written.
    async fn get(&self, store: &str, key: &str) -> Result<Option<String>, StoreError>;

    /// Creates or overwrites the value at `key`.
    async fn put(&self, store: &str, key: &str, value: String) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn delete(&self, store: &str, key: &str) -> Result<(), StoreError>;

    /// Removes every key in `store`.
    async fn clear(&self, store: &str) -> Result<(), StoreError>;

    /// Lists the keys in `store`, sorted ascending.
    async fn keys(&self, store: &str) -> Result<Vec<String>, StoreError>;

    /// Releases the backing medium. Called once on shutdown.
    async fn close(&self) {}
}
