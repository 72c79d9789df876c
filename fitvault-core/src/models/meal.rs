use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            _ => Err(format!(
                "Invalid meal type '{}'. Valid options: breakfast, lunch, dinner, snack",
                s
            )),
        }
    }
}

/// Macronutrients for one meal, or a sum of meals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
}

impl AddAssign for Nutrition {
    fn add_assign(&mut self, rhs: Self) {
        self.calories += rhs.calories;
        self.protein_g += rhs.protein_g;
        self.carbs_g += rhs.carbs_g;
        self.fat_g += rhs.fat_g;
    }
}

impl fmt::Display for Nutrition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0} kcal, {:.1}g protein, {:.1}g carbs, {:.1}g fat",
            self.calories, self.protein_g, self.carbs_g, self.fat_g
        )
    }
}

/// A logged meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: Uuid,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub name: String,
    #[serde(default)]
    pub nutrition: Nutrition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Meal {
    pub fn new(date: NaiveDate, meal_type: MealType, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            meal_type,
            name: name.into(),
            nutrition: Nutrition::default(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_nutrition(mut self, nutrition: Nutrition) -> Self {
        self.nutrition = nutrition;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
