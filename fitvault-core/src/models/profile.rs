use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::MetricSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Metric => write!(f, "metric"),
            Units::Imperial => write!(f, "imperial"),
        }
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(format!(
                "Invalid units '{}'. Valid options: metric, imperial",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_weight_kg: Option<f64>,
    #[serde(default)]
    pub units: Units,
}

impl Profile {
    /// Body-mass index for `weight_kg`, if height is known.
    pub fn bmi(&self, weight_kg: f64) -> Option<f64> {
        self.height_cm
            .filter(|h| *h > 0.0)
            .map(|h| weight_kg / (h / 100.0).powi(2))
    }
}

/// Application-wide state kept between runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    pub onboarding_complete: bool,
    pub profile: Option<Profile>,
    /// When each device integration last delivered a batch.
    pub last_import: BTreeMap<MetricSource, DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi() {
        let profile = Profile {
            name: "Sam".into(),
            height_cm: Some(180.0),
            ..Default::default()
        };
        let bmi = profile.bmi(81.0).unwrap();
        assert!((bmi - 25.0).abs() < 1e-9);

        assert!(Profile::default().bmi(81.0).is_none());
    }

    #[test]
    fn test_units_from_str() {
        assert_eq!(Units::from_str("Imperial").unwrap(), Units::Imperial);
        assert!(Units::from_str("stones").is_err());
    }

    #[test]
    fn test_app_state_defaults_from_empty_json() {
        let state: AppState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn test_last_import_keys_serialize_as_source_names() {
        let mut state = AppState::default();
        let at = "2024-01-10T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        state.last_import.insert(MetricSource::Wyze, at);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["last_import"]["wyze"], "2024-01-10T10:00:00Z");
    }
}
