use chrono::NaiveDate;
use uuid::Uuid;

use super::modify_list;
use crate::models::{Meal, Nutrition};
use crate::store::{Partition, RecordStore, StoreError};

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Meal log, one stored list per day keyed `YYYY-MM-DD`.
#[derive(Clone)]
pub struct MealRepository {
    store: RecordStore,
}

impl MealRepository {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub async fn log(&self, meal: &Meal) -> Result<Meal, StoreError> {
        let logged = meal.clone();
        modify_list(&self.store, Partition::Meals, &day_key(meal.date), |meals| {
            meals.push(logged);
            meals.sort_by(|a: &Meal, b: &Meal| {
                a.meal_type
                    .cmp(&b.meal_type)
                    .then(a.created_at.cmp(&b.created_at))
            });
        })
        .await?;
        Ok(meal.clone())
    }

    pub async fn for_day(&self, date: NaiveDate) -> Result<Vec<Meal>, StoreError> {
        Ok(self
            .store
            .get(Partition::Meals.name(), &day_key(date))
            .await?
            .unwrap_or_default())
    }

    /// Meals for every logged day within `from..=to`, in day order.
    pub async fn list_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Meal>, StoreError> {
        let mut meals = Vec::new();
        for key in self.store.keys(Partition::Meals.name()).await? {
            let Ok(date) = NaiveDate::parse_from_str(&key, "%Y-%m-%d") else {
                tracing::warn!("Ignoring unexpected meal log key '{}'", key);
                continue;
            };
            if (from..=to).contains(&date) {
                meals.extend(self.for_day(date).await?);
            }
        }
        Ok(meals)
    }

    /// Removes a meal. Drops the day's entry once it is empty.
    pub async fn delete(&self, date: NaiveDate, id: Uuid) -> Result<bool, StoreError> {
        let key = day_key(date);
        let guard = self.store.lock(Partition::Meals.name(), &key).await;
        let mut meals: Vec<Meal> = guard.get().await?.unwrap_or_default();

        let before = meals.len();
        meals.retain(|m| m.id != id);
        if meals.len() == before {
            return Ok(false);
        }

        if meals.is_empty() {
            guard.delete().await?;
        } else {
            guard.put(&meals).await?;
        }
        Ok(true)
    }

    pub async fn daily_totals(&self, date: NaiveDate) -> Result<Nutrition, StoreError> {
        let mut total = Nutrition::default();
        for meal in self.for_day(date).await? {
            total += meal.nutrition;
        }
        Ok(total)
    }

    pub async fn reset(&self) -> Result<(), StoreError> {
        self.store.clear(Partition::Meals.name()).await
    }
}
