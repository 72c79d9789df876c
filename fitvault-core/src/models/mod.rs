mod meal;
mod metric;
mod profile;
mod timestamp;
mod workout;

pub use meal::{Meal, MealType, Nutrition};
pub use metric::{BodyMetric, MetricSource};
pub use profile::{AppState, Profile, Units};
pub use timestamp::{ParseTimestampError, Timestamp};
pub use workout::{Exercise, Workout};
