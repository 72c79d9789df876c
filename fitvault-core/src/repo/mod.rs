//! Domain repositories. Each owns one partition of the record store.

mod app_state;
mod meals;
mod metrics;
mod workouts;

pub use app_state::AppStateRepository;
pub use meals::MealRepository;
pub use metrics::{ImportError, MetricsRepository, WeightTrend};
pub use workouts::WorkoutRepository;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::{Partition, RecordStore, StoreError};

/// Loads the list at `key`, applies `f`, and writes the list back, all under
/// the key's lock.
async fn modify_list<T, R>(
    store: &RecordStore,
    partition: Partition,
    key: &str,
    f: impl FnOnce(&mut Vec<T>) -> R,
) -> Result<R, StoreError>
where
    T: Serialize + DeserializeOwned,
{
    let guard = store.lock(partition.name(), key).await;
    let mut items: Vec<T> = guard.get().await?.unwrap_or_default();
    let result = f(&mut items);
    guard.put(&items).await?;
    Ok(result)
}
