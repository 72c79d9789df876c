//! In-process backend. Nothing survives the process.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::error::validate_name;
use super::{Backend, StoreError};

/// Backend holding every partition in a map.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    partitions: RwLock<HashMap<String, BTreeMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, store: &str, key: &str) -> Result<Option<String>, StoreError> {
        validate_name(store)?;
        validate_name(key)?;
        let partitions = self.partitions.read().await;
        Ok(partitions.get(store).and_then(|p| p.get(key)).cloned())
    }

    async fn put(&self, store: &str, key: &str, value: String) -> Result<(), StoreError> {
        validate_name(store)?;
        validate_name(key)?;
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(store.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, store: &str, key: &str) -> Result<(), StoreError> {
        validate_name(store)?;
        validate_name(key)?;
        let mut partitions = self.partitions.write().await;
        if let Some(partition) = partitions.get_mut(store) {
            partition.remove(key);
        }
        Ok(())
    }

    async fn clear(&self, store: &str) -> Result<(), StoreError> {
        validate_name(store)?;
        self.partitions.write().await.remove(store);
        Ok(())
    }

    async fn keys(&self, store: &str) -> Result<Vec<String>, StoreError> {
        validate_name(store)?;
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(store)
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default())
    }
}
