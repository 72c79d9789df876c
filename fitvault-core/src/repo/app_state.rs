use chrono::{DateTime, Utc};

use crate::models::{AppState, MetricSource, Profile};
use crate::store::{Partition, RecordStore, StoreError};

const STATE_KEY: &str = "state";

#[derive(Clone)]
pub struct AppStateRepository {
    store: RecordStore,
}

impl AppStateRepository {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Returns the saved state, or the default on first run.
    pub async fn load(&self) -> Result<AppState, StoreError> {
        Ok(self
            .store
            .get(Partition::AppState.name(), STATE_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn save(&self, state: &AppState) -> Result<(), StoreError> {
        self.store
            .put(Partition::AppState.name(), STATE_KEY, state)
            .await
    }

    async fn modify(&self, f: impl FnOnce(&mut AppState)) -> Result<AppState, StoreError> {
        let guard = self.store.lock(Partition::AppState.name(), STATE_KEY).await;
        let mut state: AppState = guard.get().await?.unwrap_or_default();
        f(&mut state);
        guard.put(&state).await?;
        Ok(state)
    }

    /// Stores the profile and marks onboarding as done.
    pub async fn update_profile(&self, profile: Profile) -> Result<AppState, StoreError> {
        self.modify(|state| {
            state.profile = Some(profile);
            state.onboarding_complete = true;
        })
        .await
    }

    pub async fn record_import(
        &self,
        source: MetricSource,
        at: DateTime<Utc>,
    ) -> Result<AppState, StoreError> {
        self.modify(|state| {
            state.last_import.insert(source, at);
        })
        .await
    }

    pub async fn reset(&self) -> Result<(), StoreError> {
        self.store.clear(Partition::AppState.name()).await
    }
}
