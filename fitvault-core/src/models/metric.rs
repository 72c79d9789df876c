use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Timestamp;
use crate::collection::Record;

/// Where a measurement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MetricSource {
    #[default]
    Manual,
    Wyze,
    Fitbit,
    Withings,
    Garmin,
    GoogleFit,
    AppleHealth,
}

impl MetricSource {
    pub const ALL: [MetricSource; 7] = [
        MetricSource::Manual,
        MetricSource::Wyze,
        MetricSource::Fitbit,
        MetricSource::Withings,
        MetricSource::Garmin,
        MetricSource::GoogleFit,
        MetricSource::AppleHealth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricSource::Manual => "manual",
            MetricSource::Wyze => "wyze",
            MetricSource::Fitbit => "fitbit",
            MetricSource::Withings => "withings",
            MetricSource::Garmin => "garmin",
            MetricSource::GoogleFit => "google_fit",
            MetricSource::AppleHealth => "apple_health",
        }
    }
}

impl fmt::Display for MetricSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == normalized)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                format!(
                    "Invalid source '{}'. Valid options: {}",
                    s,
                    valid.join(", ")
                )
            })
    }
}

/// One body-composition weigh-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyMetric {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub date: Timestamp,
    pub weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muscle_mass_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_pct: Option<f64>,
    #[serde(default)]
    pub source: MetricSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl BodyMetric {
    pub fn new(date: Timestamp, weight_kg: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            weight_kg,
            body_fat_pct: None,
            muscle_mass_kg: None,
            bmi: None,
            water_pct: None,
            source: MetricSource::Manual,
            note: None,
        }
    }

    pub fn with_body_fat(mut self, pct: f64) -> Self {
        self.body_fat_pct = Some(pct);
        self
    }

    pub fn with_muscle_mass(mut self, kg: f64) -> Self {
        self.muscle_mass_kg = Some(kg);
        self
    }

    pub fn with_bmi(mut self, bmi: f64) -> Self {
        self.bmi = Some(bmi);
        self
    }

    pub fn with_water(mut self, pct: f64) -> Self {
        self.water_pct = Some(pct);
        self
    }

    pub fn with_source(mut self, source: MetricSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl Record for BodyMetric {
    fn timestamp(&self) -> Timestamp {
        self.date
    }
}

impl fmt::Display for BodyMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {:.1} kg", self.date.day_key(), self.weight_kg)?;
        if let Some(fat) = self.body_fat_pct {
            write!(f, "  {:.1}% fat", fat)?;
        }
        if let Some(muscle) = self.muscle_mass_kg {
            write!(f, "  {:.1} kg muscle", muscle)?;
        }
        if let Some(bmi) = self.bmi {
            write!(f, "  BMI {:.1}", bmi)?;
        }
        if let Some(water) = self.water_pct {
            write!(f, "  {:.1}% water", water)?;
        }
        write!(f, "  [{}]", self.source)
    }
}
