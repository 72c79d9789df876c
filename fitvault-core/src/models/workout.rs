use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One exercise in a planned workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
}

impl Exercise {
    pub fn new(name: impl Into<String>, sets: u32, reps: u32) -> Self {
        Self {
            name: name.into(),
            sets,
            reps,
            weight_kg: None,
        }
    }

    pub fn with_weight(mut self, kg: f64) -> Self {
        self.weight_kg = Some(kg);
        self
    }

    /// Total kilograms moved, if a working weight is set.
    pub fn volume_kg(&self) -> Option<f64> {
        self.weight_kg
            .map(|kg| kg * f64::from(self.sets) * f64::from(self.reps))
    }
}

/// Parses `name:sets:reps[:weight]`.
impl FromStr for Exercise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let invalid = || format!("Invalid exercise '{}'. Use name:sets:reps[:weight]", s);

        if !(3..=4).contains(&parts.len()) || parts[0].is_empty() {
            return Err(invalid());
        }

        let sets = parts[1].parse().map_err(|_| invalid())?;
        let reps = parts[2].parse().map_err(|_| invalid())?;
        let mut exercise = Exercise::new(parts[0], sets, reps);
        if let Some(weight) = parts.get(3) {
            exercise.weight_kg = Some(weight.parse().map_err(|_| invalid())?);
        }
        Ok(exercise)
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.name, self.sets, self.reps)?;
        if let Some(kg) = self.weight_kg {
            write!(f, " @ {} kg", kg)?;
        }
        Ok(())
    }
}

/// A planned (and possibly completed) training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Workout {
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            date,
            exercises: Vec::new(),
            completed: false,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_exercises(mut self, exercises: Vec<Exercise>) -> Self {
        self.exercises = exercises;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn total_volume_kg(&self) -> f64 {
        self.exercises.iter().filter_map(Exercise::volume_kg).sum()
    }
}

impl fmt::Display for Workout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.completed { "done" } else { "planned" };
        writeln!(f, "{} ({}) - {}", self.name, self.date, status)?;
        writeln!(f, "{}", "=".repeat(30))?;

        for exercise in &self.exercises {
            writeln!(f, "  - {}", exercise)?;
        }

        if let Some(notes) = &self.notes {
            writeln!(f, "\nNotes: {}", notes)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_from_str() {
        let squat: Exercise = "Squat:5:5:100".parse().unwrap();
        assert_eq!(squat.name, "Squat");
        assert_eq!(squat.sets, 5);
        assert_eq!(squat.reps, 5);
        assert_eq!(squat.weight_kg, Some(100.0));

        let pushup: Exercise = "Push-up : 3 : 15".parse().unwrap();
        assert_eq!(pushup.name, "Push-up");
        assert!(pushup.weight_kg.is_none());
    }

    #[test]
    fn test_exercise_from_str_invalid() {
        assert!("Squat".parse::<Exercise>().is_err());
        assert!("Squat:five:5".parse::<Exercise>().is_err());
        assert!(":3:5".parse::<Exercise>().is_err());
        assert!("Squat:5:5:100:extra".parse::<Exercise>().is_err());
    }

    #[test]
    fn test_total_volume() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let workout = Workout::new("Legs", date).with_exercises(vec![
            Exercise::new("Squat", 5, 5).with_weight(100.0),
            Exercise::new("Lunge", 3, 10),
            Exercise::new("Calf raise", 3, 20).with_weight(40.0),
        ]);
        assert_eq!(workout.total_volume_kg(), 2500.0 + 2400.0);
    }

    #[test]
    fn test_workout_display() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let workout = Workout::new("Push day", date)
            .with_exercises(vec![Exercise::new("Bench", 3, 8).with_weight(60.0)])
            .with_notes("felt strong");

        let output = workout.to_string();
        assert!(output.contains("Push day (2024-01-10) - planned"));
        assert!(output.contains("Bench 3x8 @ 60 kg"));
        assert!(output.contains("felt strong"));
    }
}
