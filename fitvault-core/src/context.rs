//! Process-wide handle to the opened record store.
//!
//! Built once at start-up with [`Context::open`], passed by reference to
//! whatever needs data access, and closed on shutdown.

use crate::repo::{AppStateRepository, MealRepository, MetricsRepository, WorkoutRepository};
use crate::store::{BackendConfig, RecordStore, StoreError};

pub struct Context {
    store: RecordStore,
}

impl Context {
    /// Opens the configured backend. Directories and schema are created here.
    pub async fn open(config: &BackendConfig) -> Result<Self, StoreError> {
        let backend = config.open().await?;
        tracing::info!("Opened record store: {:?}", config);
        Ok(Self::with_store(RecordStore::from_backend(backend)))
    }

    pub fn with_store(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn metrics(&self) -> MetricsRepository {
        MetricsRepository::new(self.store.clone())
    }

    pub fn workouts(&self) -> WorkoutRepository {
        WorkoutRepository::new(self.store.clone())
    }

    pub fn meals(&self) -> MealRepository {
        MealRepository::new(self.store.clone())
    }

    pub fn app_state(&self) -> AppStateRepository {
        AppStateRepository::new(self.store.clone())
    }

    /// Releases the backend.
    pub async fn close(self) {
        self.store.close().await;
        tracing::debug!("Closed record store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyMetric, Meal, MealType, Workout};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_data_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let config = BackendConfig::Sqlite(temp_dir.path().join("fitvault.db"));
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let ctx = Context::open(&config).await.unwrap();
        ctx.metrics()
            .import(vec![BodyMetric::new("2024-01-10T07:00".parse().unwrap(), 80.0)])
            .await
            .unwrap();
        ctx.workouts().create(&Workout::new("Run", date)).await.unwrap();
        ctx.meals()
            .log(&Meal::new(date, MealType::Lunch, "Salad"))
            .await
            .unwrap();
        ctx.close().await;

        let ctx = Context::open(&config).await.unwrap();
        assert_eq!(ctx.metrics().list().await.unwrap().len(), 1);
        assert_eq!(ctx.workouts().list().await.unwrap().len(), 1);
        assert_eq!(ctx.meals().for_day(date).await.unwrap().len(), 1);
        ctx.close().await;
    }

    #[tokio::test]
    async fn test_reset_only_touches_own_partition() {
        let ctx = Context::with_store(RecordStore::in_memory());
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        ctx.metrics()
            .add(BodyMetric::new("2024-01-10".parse().unwrap(), 80.0))
            .await
            .unwrap();
        ctx.workouts().create(&Workout::new("Run", date)).await.unwrap();

        ctx.metrics().reset().await.unwrap();

        assert!(ctx.metrics().list().await.unwrap().is_empty());
        assert_eq!(ctx.workouts().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_file_backend_in_unwritable_place_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let result = Context::open(&BackendConfig::Files(blocker.join("records"))).await;
        assert!(matches!(result, Err(StoreError::StorageUnavailable(_))));
    }
}
