use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::collection::{Collection, ImportSummary, MergeOutcome, Record};
use crate::import::{validate_batch, ImportReport, ValidationError};
use crate::models::{BodyMetric, MetricSource};
use crate::store::{Partition, RecordStore, StoreError};

const BODY_KEY: &str = "body";

/// Failure of a metrics import.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The existing collection could not be read; nothing was merged.
    #[error("Failed to load existing metrics: {0}")]
    Load(#[source] StoreError),

    /// The merge succeeded but the result could not be written.
    #[error("Merged ({summary}) but failed to save: {source}")]
    Persist {
        summary: ImportSummary,
        rejected: Vec<ValidationError>,
        merged: Collection<BodyMetric>,
        #[source]
        source: StoreError,
    },
}

/// Weight change across a window of weigh-ins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightTrend {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub start_kg: f64,
    pub end_kg: f64,
    pub change_kg: f64,
    pub readings: usize,
}

/// Body metrics, stored as one day-keyed collection.
#[derive(Clone)]
pub struct MetricsRepository {
    store: RecordStore,
}

impl MetricsRepository {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    async fn load(&self) -> Result<Collection<BodyMetric>, StoreError> {
        Ok(self
            .store
            .get(Partition::Metrics.name(), BODY_KEY)
            .await?
            .unwrap_or_default())
    }

    /// All metrics, oldest first.
    pub async fn list(&self) -> Result<Vec<BodyMetric>, StoreError> {
        Ok(self.load().await?.into_records())
    }

    /// Metrics whose day falls within `from..=to`.
    pub async fn list_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BodyMetric>, StoreError> {
        let mut metrics = self.list().await?;
        metrics.retain(|m| (from..=to).contains(&m.day_key()));
        Ok(metrics)
    }

    pub async fn latest(&self) -> Result<Option<BodyMetric>, StoreError> {
        Ok(self.load().await?.latest().cloned())
    }

    /// Adds one metric under the same later-wins rule as an import.
    pub async fn add(&self, metric: BodyMetric) -> Result<MergeOutcome, StoreError> {
        let guard = self.store.lock(Partition::Metrics.name(), BODY_KEY).await;
        let mut collection: Collection<BodyMetric> = guard.get().await?.unwrap_or_default();

        let outcome = collection.insert(metric);
        if outcome != MergeOutcome::Duplicate {
            guard.put(&collection).await?;
        }
        Ok(outcome)
    }

    /// Merges a batch into the stored collection and saves it.
    pub async fn import(&self, batch: Vec<BodyMetric>) -> Result<ImportSummary, ImportError> {
        Ok(self.merge_and_save(batch, Vec::new()).await?.summary)
    }

    /// Validates a raw JSON batch and imports what passes.
    ///
    /// Rejected elements are counted in `invalid` and returned in the report;
    /// they never abort the batch. `source`, when given, overrides the source
    /// tag on every accepted record. The report lists the distinct sources of
    /// the accepted records.
    pub async fn import_json(
        &self,
        values: Vec<Value>,
        source: Option<MetricSource>,
    ) -> Result<ImportReport, ImportError> {
        let (mut batch, rejected): (Vec<BodyMetric>, _) = validate_batch(values);

        for err in &rejected {
            tracing::warn!("Skipping {}", err);
        }
        if let Some(source) = source {
            for metric in &mut batch {
                metric.source = source;
            }
        }

        self.merge_and_save(batch, rejected).await
    }

    async fn merge_and_save(
        &self,
        batch: Vec<BodyMetric>,
        rejected: Vec<ValidationError>,
    ) -> Result<ImportReport, ImportError> {
        let sources: BTreeSet<MetricSource> = batch.iter().map(|m| m.source).collect();

        let guard = self.store.lock(Partition::Metrics.name(), BODY_KEY).await;
        let mut collection: Collection<BodyMetric> = guard
            .get()
            .await
            .map_err(ImportError::Load)?
            .unwrap_or_default();

        let mut summary = collection.merge(batch);
        summary.invalid = rejected.len();

        if let Err(source) = guard.put(&collection).await {
            tracing::warn!("Import merged but not saved: {}", source);
            return Err(ImportError::Persist {
                summary,
                rejected,
                merged: collection,
                source,
            });
        }

        tracing::info!(
            added = summary.added,
            replaced = summary.replaced,
            duplicates = summary.duplicates,
            invalid = summary.invalid,
            total = collection.len(),
            "Imported body metrics"
        );
        Ok(ImportReport {
            summary,
            rejected,
            sources: sources.into_iter().collect(),
        })
    }

    /// Removes the metric with `id`. Returns false if there was none.
    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let guard = self.store.lock(Partition::Metrics.name(), BODY_KEY).await;
        let mut collection: Collection<BodyMetric> = guard.get().await?.unwrap_or_default();

        let before = collection.len();
        collection.retain(|m| m.id != id);
        if collection.len() == before {
            return Ok(false);
        }
        guard.put(&collection).await?;
        Ok(true)
    }

    /// Drops every stored metric.
    pub async fn reset(&self) -> Result<(), StoreError> {
        tracing::info!("Resetting body metrics");
        self.store.clear(Partition::Metrics.name()).await
    }

    /// Weight change from the first to the last reading on or after `since`.
    ///
    /// `None` with fewer than two readings in the window.
    pub async fn trend(&self, since: NaiveDate) -> Result<Option<WeightTrend>, StoreError> {
        let collection = self.load().await?;
        let window: Vec<&BodyMetric> = collection
            .iter()
            .filter(|m| m.day_key() >= since)
            .collect();

        let (first, last) = match (window.first(), window.last()) {
            (Some(first), Some(last)) if window.len() >= 2 => (*first, *last),
            _ => return Ok(None),
        };

        Ok(Some(WeightTrend {
            from: first.day_key(),
            to: last.day_key(),
            start_kg: first.weight_kg,
            end_kg: last.weight_kg,
            change_kg: last.weight_kg - first.weight_kg,
            readings: window.len(),
        }))
    }
}
