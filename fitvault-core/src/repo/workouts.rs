use chrono::NaiveDate;
use uuid::Uuid;

use super::modify_list;
use crate::models::Workout;
use crate::store::{Partition, RecordStore, StoreError};

const PLAN_KEY: &str = "plan";

fn sort_plan(workouts: &mut [Workout]) {
    workouts.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
}

/// Workout plan, stored as one list ordered by date.
#[derive(Clone)]
pub struct WorkoutRepository {
    store: RecordStore,
}

impl WorkoutRepository {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    async fn modify<R>(&self, f: impl FnOnce(&mut Vec<Workout>) -> R) -> Result<R, StoreError> {
        modify_list(&self.store, Partition::Workouts, PLAN_KEY, |workouts| {
            let result = f(workouts);
            sort_plan(workouts);
            result
        })
        .await
    }

    pub async fn create(&self, workout: &Workout) -> Result<Workout, StoreError> {
        let created = workout.clone();
        self.modify(|workouts| workouts.push(created)).await?;
        tracing::debug!("Created workout {}", workout.id);
        Ok(workout.clone())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Workout>, StoreError> {
        Ok(self.list().await?.into_iter().find(|w| w.id == id))
    }

    pub async fn list(&self) -> Result<Vec<Workout>, StoreError> {
        let mut workouts: Vec<Workout> = self
            .store
            .get(Partition::Workouts.name(), PLAN_KEY)
            .await?
            .unwrap_or_default();
        sort_plan(&mut workouts);
        Ok(workouts)
    }

    pub async fn list_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Workout>, StoreError> {
        let mut workouts = self.list().await?;
        workouts.retain(|w| (from..=to).contains(&w.date));
        Ok(workouts)
    }

    /// Replaces the stored workout with the same id. Returns false if absent.
    pub async fn update(&self, workout: &Workout) -> Result<bool, StoreError> {
        let updated = workout.clone();
        self.modify(|workouts| match workouts.iter_mut().find(|w| w.id == updated.id) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        })
        .await
    }

    pub async fn set_completed(
        &self,
        id: Uuid,
        completed: bool,
    ) -> Result<Option<Workout>, StoreError> {
        self.modify(|workouts| {
            workouts.iter_mut().find(|w| w.id == id).map(|w| {
                w.completed = completed;
                w.clone()
            })
        })
        .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.modify(|workouts| {
            let before = workouts.len();
            workouts.retain(|w| w.id != id);
            workouts.len() != before
        })
        .await
    }

    pub async fn reset(&self) -> Result<(), StoreError> {
        self.store.clear(Partition::Workouts.name()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Exercise;

    fn setup_repo() -> WorkoutRepository {
        WorkoutRepository::new(RecordStore::in_memory())
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_workout() {
        let repo = setup_repo();

        let workout = Workout::new("Legs", day(10))
            .with_exercises(vec![Exercise::new("Squat", 5, 5).with_weight(100.0)]);
        repo.create(&workout).await.unwrap();

        let fetched = repo.get_by_id(workout.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Legs");
        assert_eq!(fetched.exercises.len(), 1);
        assert!(!fetched.completed);
    }

    #[tokio::test]
    async fn test_list_sorted_by_date() {
        let repo = setup_repo();

        repo.create(&Workout::new("C", day(12))).await.unwrap();
        repo.create(&Workout::new("A", day(10))).await.unwrap();
        repo.create(&Workout::new("B", day(11))).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        let range = repo.list_range(day(11), day(12)).await.unwrap();
        assert_eq!(range.len(), 2);
    }

    #[tokio::test]
    async fn test_update_workout() {
        let repo = setup_repo();
        let created = repo.create(&Workout::new("Original", day(10))).await.unwrap();

        let mut changed = created.clone();
        changed.name = "Renamed".to_string();
        changed.date = day(14);
        assert!(repo.update(&changed).await.unwrap());

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Renamed");
        assert_eq!(fetched.date, day(14));

        assert!(!repo.update(&Workout::new("Ghost", day(1))).await.unwrap());
    }

    #[tokio::test]
    async fn test_complete_and_delete() {
        let repo = setup_repo();
        let workout = repo.create(&Workout::new("Run", day(10))).await.unwrap();

        let done = repo.set_completed(workout.id, true).await.unwrap().unwrap();
        assert!(done.completed);
        assert!(repo.set_completed(Uuid::new_v4(), true).await.unwrap().is_none());

        assert!(repo.delete(workout.id).await.unwrap());
        assert!(repo.get_by_id(workout.id).await.unwrap().is_none());
        assert!(!repo.delete(workout.id).await.unwrap());
    }
}
