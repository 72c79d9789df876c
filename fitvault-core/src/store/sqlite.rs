//! SQLite backend.
//!
//! Every partition shares one `records` table keyed by
//! `(store_name, record_key)`. The schema lives in `migrations/` and is
//! applied when the backend is opened.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use super::error::validate_name;
use super::{Backend, StoreError};

/// Backend storing records in a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Opens (creating if needed) the database at `path` and runs migrations.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::unavailable(parent.display(), e))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", path.display());

        let options = SqliteConnectOptions::from_str(&db_url)
            .map_err(|e| StoreError::unavailable(path.display(), e))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::unavailable(path.display(), e))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::unavailable("migrations", e))?;

        tracing::debug!("Opened SQLite record store at {}", path.display());

        Ok(Self { pool })
    }
}

fn db_error(op: &str, err: sqlx::Error) -> StoreError {
    StoreError::unavailable(op, err)
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn get(&self, store: &str, key: &str) -> Result<Option<String>, StoreError> {
        validate_name(store)?;
        validate_name(key)?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM records WHERE store_name = ? AND record_key = ?")
                .bind(store)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("get", e))?;

        Ok(row.map(|(value,)| value))
    }

    async fn put(&self, store: &str, key: &str, value: String) -> Result<(), StoreError> {
        validate_name(store)?;
        validate_name(key)?;

        sqlx::query(
            r#"
            INSERT INTO records (store_name, record_key, value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (store_name, record_key)
            DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(store)
        .bind(key)
        .bind(&value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("put", e))?;

        Ok(())
    }

    async fn delete(&self, store: &str, key: &str) -> Result<(), StoreError> {
        validate_name(store)?;
        validate_name(key)?;

        sqlx::query("DELETE FROM records WHERE store_name = ? AND record_key = ?")
            .bind(store)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete", e))?;
        Ok(())
    }

    async fn clear(&self, store: &str) -> Result<(), StoreError> {
        validate_name(store)?;

        sqlx::query("DELETE FROM records WHERE store_name = ?")
            .bind(store)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("clear", e))?;
        Ok(())
    }

    async fn keys(&self, store: &str) -> Result<Vec<String>, StoreError> {
        validate_name(store)?;

        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT record_key FROM records WHERE store_name = ? ORDER BY record_key",
        )
        .bind(store)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("keys", e))?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct TestContext {
        backend: SqliteBackend,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    async fn setup() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let backend = SqliteBackend::open(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        TestContext {
            backend,
            _temp_dir: temp_dir,
        }
    }

    #[tokio::test]
    async fn test_open_creates_records_table() {
        let ctx = setup().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx_%'",
        )
        .fetch_all(&ctx.backend.pool)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(names, vec!["records"]);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let ctx = setup().await;
        let backend = &ctx.backend;

        backend.put("metrics", "body", "1".into()).await.unwrap();
        backend.put("metrics", "body", "2".into()).await.unwrap();

        assert_eq!(
            backend.get("metrics", "body").await.unwrap().as_deref(),
            Some("2")
        );
        assert_eq!(backend.keys("metrics").await.unwrap(), vec!["body"]);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let ctx = setup().await;
        let backend = &ctx.backend;

        backend.put("meals", "2024-01-10", "[]".into()).await.unwrap();
        backend.put("meals", "2024-01-11", "[]".into()).await.unwrap();
        backend.put("workouts", "plan", "[]".into()).await.unwrap();

        backend.delete("meals", "2024-01-10").await.unwrap();
        assert_eq!(backend.keys("meals").await.unwrap(), vec!["2024-01-11"]);

        backend.clear("meals").await.unwrap();
        assert!(backend.keys("meals").await.unwrap().is_empty());
        assert!(backend.get("workouts", "plan").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("fitvault.db");

        let backend = SqliteBackend::open(&path).await.unwrap();
        backend.put("app_state", "state", "{}".into()).await.unwrap();
        backend.close().await;

        let reopened = SqliteBackend::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("app_state", "state").await.unwrap().as_deref(),
            Some("{}")
        );
    }
}
