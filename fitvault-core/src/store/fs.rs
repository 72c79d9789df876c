//! Filesystem backend.
//!
//! Stores one JSON file per key:
//! ```text
//! <DATA_DIR>/
//!   metrics/
//!     body.json
//!   meals/
//!     2024-01-10.json
//! ```

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use tokio::fs;

use super::error::validate_name;
use super::{Backend, StoreError};

const EXTENSION: &str = "json";

/// Backend storing each key as a file inside a per-partition directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    data_dir: PathBuf,
}

impl FileBackend {
    /// Opens the backend rooted at `data_dir`, creating the directory.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| StoreError::unavailable(data_dir.display(), e))?;
        Ok(Self { data_dir })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    fn partition_dir(&self, store: &str) -> Result<PathBuf, StoreError> {
        validate_name(store)?;
        Ok(self.data_dir.join(store))
    }

    fn key_path(&self, store: &str, key: &str) -> Result<PathBuf, StoreError> {
        validate_name(key)?;
        Ok(self
            .partition_dir(store)?
            .join(format!("{}.{}", key, EXTENSION)))
    }
}

#[async_trait]
impl Backend for FileBackend {
    async fn get(&self, store: &str, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(store, key)?;

        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::unavailable(path.display(), e)),
        }
    }

    async fn put(&self, store: &str, key: &str, value: String) -> Result<(), StoreError> {
        let dir = self.partition_dir(store)?;
        let path = self.key_path(store, key)?;

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::unavailable(dir.display(), e))?;

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("json.tmp");

        fs::write(&temp_path, value.as_bytes())
            .await
            .map_err(|e| StoreError::unavailable(temp_path.display(), e))?;

        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| StoreError::unavailable(path.display(), e))?;

        Ok(())
    }

    async fn delete(&self, store: &str, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(store, key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::unavailable(path.display(), e)),
        }
    }

    async fn clear(&self, store: &str) -> Result<(), StoreError> {
        let dir = self.partition_dir(store)?;

        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::unavailable(dir.display(), e)),
        }
    }

    async fn keys(&self, store: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.partition_dir(store)?;

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::unavailable(dir.display(), e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::unavailable(dir.display(), e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup() -> (FileBackend, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::open(temp_dir.path()).await.unwrap();
        (backend, temp_dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent_returns_none() {
        let (backend, _temp) = setup().await;
        assert!(backend.get("metrics", "body").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_directory_structure() {
        let (backend, temp) = setup().await;

        backend.put("meals", "2024-01-10", "[]".into()).await.unwrap();

        let expected_path = temp.path().join("meals").join("2024-01-10.json");
        assert!(expected_path.exists());
        assert!(!temp.path().join("meals").join("2024-01-10.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_overwrite_existing() {
        let (backend, _temp) = setup().await;

        backend.put("metrics", "body", "1".into()).await.unwrap();
        backend.put("metrics", "body", "2".into()).await.unwrap();

        assert_eq!(
            backend.get("metrics", "body").await.unwrap().as_deref(),
            Some("2")
        );
    }

    #[tokio::test]
    async fn test_keys_ignore_temp_files() {
        let (backend, temp) = setup().await;

        backend.put("meals", "2024-01-11", "[]".into()).await.unwrap();
        backend.put("meals", "2024-01-10", "[]".into()).await.unwrap();
        std::fs::write(temp.path().join("meals").join("stale.json.tmp"), "x").unwrap();

        let keys = backend.keys("meals").await.unwrap();
        assert_eq!(keys, vec!["2024-01-10", "2024-01-11"]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let (backend, _temp) = setup().await;
        backend.delete("metrics", "body").await.unwrap();
        backend.clear("metrics").await.unwrap();
        assert!(backend.keys("metrics").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let (backend, _temp) = setup().await;
        assert!(matches!(
            backend.put("../evil", "x", "1".into()).await,
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            backend.get("metrics", "foo/bar").await,
            Err(StoreError::InvalidKey(_))
        ));
    }
}
