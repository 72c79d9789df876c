//! Keyed record store.
//!
//! Maps a partition ("store") name and a string key to a JSON value. Every
//! domain collection persists through a [`RecordStore`]; the medium behind it
//! is any [`Backend`]:
//!
//! - [`MemoryBackend`]: in-process map, nothing is durable
//! - [`SqliteBackend`]: one `records` table in a SQLite file
//! - [`FileBackend`]: `<data_dir>/<store>/<key>.json`
//!
//! Writes to the same `(store, key)` are serialized inside the process. A
//! caller that needs read-modify-write takes the key with
//! [`RecordStore::lock`] and performs both halves through the returned guard.
//! [`RecordStore::clear`] waits for every live guard in the store and holds
//! new ones off until the clear is done.

mod backend;
mod error;
mod fs;
mod memory;
mod sqlite;

pub use backend::Backend;
pub use error::StoreError;
pub use fs::FileBackend;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, OwnedRwLockReadGuard, RwLock};

/// Built-in partitions, one per domain collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Metrics,
    Workouts,
    Meals,
    AppState,
}

impl Partition {
    pub const ALL: [Partition; 4] = [
        Partition::Metrics,
        Partition::Workouts,
        Partition::Meals,
        Partition::AppState,
    ];

    /// Returns the store name used by backends.
    pub fn name(&self) -> &'static str {
        match self {
            Partition::Metrics => "metrics",
            Partition::Workouts => "workouts",
            Partition::Meals => "meals",
            Partition::AppState => "app_state",
        }
    }

    /// Parse from store name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which backend to open at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Memory,
    Sqlite(PathBuf),
    Files(PathBuf),
}

impl BackendConfig {
    /// Opens the configured medium.
    pub async fn open(&self) -> Result<Arc<dyn Backend>, StoreError> {
        let backend: Arc<dyn Backend> = match self {
            BackendConfig::Memory => Arc::new(MemoryBackend::new()),
            BackendConfig::Sqlite(path) => Arc::new(SqliteBackend::open(path).await?),
            BackendConfig::Files(dir) => Arc::new(FileBackend::open(dir.clone()).await?),
        };
        Ok(backend)
    }
}

/// Lock slots that are held or awaited. Idle slots are removed.
#[derive(Default)]
struct LockTable {
    partitions: HashMap<String, Arc<RwLock<()>>>,
    keys: HashMap<(String, String), Arc<AsyncMutex<()>>>,
}

impl LockTable {
    fn partition(&mut self, store: &str) -> Arc<RwLock<()>> {
        self.partitions.entry(store.to_string()).or_default().clone()
    }

    /// Drops slots nobody else references any more.
    fn release(&mut self, store: &str, key: Option<&str>) {
        if let Some(key) = key {
            let id = (store.to_string(), key.to_string());
            if self.keys.get(&id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
                self.keys.remove(&id);
            }
        }
        if self
            .partitions
            .get(store)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            self.partitions.remove(store);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.partitions.len() + self.keys.len()
    }
}

/// JSON record store over a [`Backend`].
///
/// Cheap to clone; clones share the backend and the per-key locks.
#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn Backend>,
    locks: Arc<Mutex<LockTable>>,
}

impl RecordStore {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self::from_backend(Arc::new(backend))
    }

    pub fn from_backend(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            locks: Arc::new(Mutex::new(LockTable::default())),
        }
    }

    /// Store over a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    fn lock_table(&self) -> std::sync::MutexGuard<'_, LockTable> {
        self.locks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Takes the write lock for `(store, key)`.
    ///
    /// Waits until no other guard for the same key is alive and no clear of
    /// `store` is running.
    pub async fn lock(&self, store: &str, key: &str) -> KeyGuard<'_> {
        let (partition_slot, key_slot) = {
            let mut locks = self.lock_table();
            let partition_slot = locks.partition(store);
            let key_slot = locks
                .keys
                .entry((store.to_string(), key.to_string()))
                .or_default()
                .clone();
            (partition_slot, key_slot)
        };
        let shared = partition_slot.read_owned().await;
        let held = key_slot.lock_owned().await;
        KeyGuard {
            store: self,
            partition: store.to_string(),
            key: key.to_string(),
            held: Some((shared, held)),
        }
    }

    /// Returns the value at `key`, or `None` if it was never written.
    pub async fn get<T: DeserializeOwned>(
        &self,
        store: &str,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let raw = self.backend.get(store, key).await?;
        tracing::debug!(store, key, found = raw.is_some(), "record get");
        raw.map(|text| decode(store, key, &text)).transpose()
    }

    /// Creates or overwrites the value at `key`.
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        store: &str,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        self.lock(store, key).await.put(value).await
    }

    /// Removes `key`.
    pub async fn delete(&self, store: &str, key: &str) -> Result<(), StoreError> {
        self.lock(store, key).await.delete().await
    }

    /// Removes every key in `store`.
    ///
    /// Runs only once every guard in `store` is released, so a read-modify-write
    /// in flight either lands before the clear or starts after it.
    pub async fn clear(&self, store: &str) -> Result<(), StoreError> {
        let slot = self.lock_table().partition(store);
        let exclusive = slot.write_owned().await;

        tracing::debug!(store, "record clear");
        let result = self.backend.clear(store).await;

        drop(exclusive);
        self.lock_table().release(store, None);
        result
    }

    /// Lists the keys in `store`, sorted ascending.
    pub async fn keys(&self, store: &str) -> Result<Vec<String>, StoreError> {
        self.backend.keys(store).await
    }

    /// Releases the backend.
    pub async fn close(&self) {
        self.backend.close().await;
    }
}

/// Exclusive access to one `(store, key)` for the guard's lifetime.
pub struct KeyGuard<'a> {
    store: &'a RecordStore,
    partition: String,
    key: String,
    held: Option<(OwnedRwLockReadGuard<()>, OwnedMutexGuard<()>)>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.held.take();
        self.store
            .lock_table()
            .release(&self.partition, Some(&self.key));
    }
}

impl KeyGuard<'_> {
    pub async fn get<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        self.store.get(&self.partition, &self.key).await
    }

    pub async fn put<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), StoreError> {
        let text = serde_json::to_string(value).map_err(|e| StoreError::Serialization {
            store: self.partition.clone(),
            key: self.key.clone(),
            source: e,
        })?;
        tracing::debug!(
            store = %self.partition,
            key = %self.key,
            bytes = text.len(),
            "record put"
        );
        self.store
            .backend
            .put(&self.partition, &self.key, text)
            .await
    }

    pub async fn delete(&self) -> Result<(), StoreError> {
        tracing::debug!(store = %self.partition, key = %self.key, "record delete");
        self.store.backend.delete(&self.partition, &self.key).await
    }
}

fn decode<T: DeserializeOwned>(store: &str, key: &str, text: &str) -> Result<T, StoreError> {
    serde_json::from_str(text).map_err(|e| StoreError::Serialization {
        store: store.to_string(),
        key: key.to_string(),
        source: e,
    })
}
