//! fitvault core library
//!
//! Record store, domain models and the body-metrics import used by the
//! fitvault applications.

pub mod collection;
pub mod context;
pub mod import;
pub mod models;
pub mod repo;
pub mod store;

pub use collection::{merge, Collection, ImportSummary, MergeOutcome, Record};
pub use context::Context;
pub use import::{batch_from_json, validate_batch, ImportReport, ValidationError};
pub use models::{
    AppState, BodyMetric, Exercise, Meal, MealType, MetricSource, Nutrition, ParseTimestampError,
    Profile, Timestamp, Units, Workout,
};
pub use repo::{
    AppStateRepository, ImportError, MealRepository, MetricsRepository, WeightTrend,
    WorkoutRepository,
};
pub use store::{
    Backend, BackendConfig, FileBackend, MemoryBackend, Partition, RecordStore, SqliteBackend,
    StoreError,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
