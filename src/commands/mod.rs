mod config_cmd;
mod meal;
mod metrics;
mod profile;
mod workout;

pub use config_cmd::ConfigCommand;
pub use meal::MealCommand;
pub use metrics::MetricsCommand;
pub use profile::ProfileCommand;
pub use workout::WorkoutCommand;

use chrono::{Local, NaiveDate};
use clap::ValueEnum;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Parses a YYYY-MM-DD argument.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", s))
}

/// Resolves `--from`/`--to`, defaulting to the `days` before today.
pub fn date_range(
    from: &Option<String>,
    to: &Option<String>,
    days: i64,
) -> Result<(NaiveDate, NaiveDate), String> {
    let to_date = match to {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    let from_date = match from {
        Some(d) => parse_date(d)?,
        None => to_date - chrono::Duration::days(days),
    };
    Ok((from_date, to_date))
}
