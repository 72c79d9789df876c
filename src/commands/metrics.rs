use chrono::{Local, NaiveDate, TimeDelta, Utc};
use clap::{Args, Subcommand};
use fitvault_core::{
    batch_from_json, BodyMetric, Context, ImportError, MergeOutcome, MetricSource, Timestamp,
};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{date_range, OutputFormat};

#[derive(Args)]
pub struct MetricsCommand {
    #[command(subcommand)]
    pub command: MetricsSubcommand,
}

#[derive(Subcommand)]
pub enum MetricsSubcommand {
    /// Record a weigh-in
    Add {
        /// Weight in kilograms
        #[arg(long, short)]
        weight: f64,

        /// Date or date-time (ISO 8601), defaults to now
        #[arg(long, short)]
        date: Option<String>,

        /// Body fat percentage
        #[arg(long)]
        body_fat: Option<f64>,

        /// Muscle mass in kilograms
        #[arg(long)]
        muscle_mass: Option<f64>,

        /// Body-mass index
        #[arg(long)]
        bmi: Option<f64>,

        /// Body water percentage
        #[arg(long)]
        water: Option<f64>,

        /// Where the reading came from
        #[arg(long, default_value = "manual")]
        source: String,

        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },

    /// List weigh-ins
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Start date (YYYY-MM-DD), defaults to 30 days ago
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,
    },

    /// Import weigh-ins from a JSON export
    Import {
        /// JSON file: an array of records or {"records": [...]}
        file: PathBuf,

        /// Tag every imported record with this source
        #[arg(long)]
        source: Option<String>,
    },

    /// Delete a weigh-in by ID
    Delete {
        /// Metric ID (UUID)
        id: String,
    },

    /// Delete all weigh-ins
    Reset {
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },

    /// Show weight change over recent days
    Trend {
        /// Number of days to look back (1 to 36500)
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(1..=MAX_TREND_DAYS))]
        days: i64,
    },
}

const MAX_TREND_DAYS: i64 = 36_500;

/// First day of a `days`-long window ending on `today`.
fn window_start(today: NaiveDate, days: i64) -> Result<NaiveDate, String> {
    TimeDelta::try_days(days)
        .and_then(|span| today.checked_sub_signed(span))
        .ok_or_else(|| format!("--days {} reaches outside the supported date range", days))
}

impl MetricsCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            MetricsSubcommand::Add {
                weight,
                date,
                body_fat,
                muscle_mass,
                bmi,
                water,
                source,
                note,
            } => {
                let date = match date {
                    Some(d) => d.parse::<Timestamp>()?,
                    None => Timestamp::now(),
                };
                let source: MetricSource = source.parse()?;

                let mut metric = BodyMetric::new(date, *weight).with_source(source);
                metric.body_fat_pct = *body_fat;
                metric.muscle_mass_kg = *muscle_mass;
                metric.bmi = *bmi;
                metric.water_pct = *water;
                metric.note = note.clone();

                let id = metric.id;
                match ctx.metrics().add(metric).await? {
                    MergeOutcome::Added => println!("Recorded weigh-in {}", id),
                    MergeOutcome::Replaced => {
                        println!("Replaced earlier weigh-in for {} ({})", date.day_key(), id)
                    }
                    MergeOutcome::Duplicate => println!(
                        "A later weigh-in already exists for {}; nothing recorded",
                        date.day_key()
                    ),
                }
                Ok(())
            }
            MetricsSubcommand::List { format, from, to } => {
                let (from, to) = date_range(from, to, 30)?;
                let metrics = ctx.metrics().list_range(from, to).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&metrics)?);
                    }
                    OutputFormat::Text => {
                        if metrics.is_empty() {
                            println!("No weigh-ins found for {} to {}", from, to);
                            return Ok(());
                        }
                        for metric in &metrics {
                            println!("{}", metric);
                        }
                        println!("\nTotal: {} weigh-in(s)", metrics.len());
                    }
                }
                Ok(())
            }
            MetricsSubcommand::Import { file, source } => {
                self.import(ctx, file, source.as_deref()).await
            }
            MetricsSubcommand::Delete { id } => {
                let uuid =
                    Uuid::parse_str(id).map_err(|_| format!("Invalid metric UUID: {}", id))?;
                if ctx.metrics().delete(uuid).await? {
                    println!("Deleted weigh-in {}", id);
                } else {
                    return Err(format!("Weigh-in not found: {}", id).into());
                }
                Ok(())
            }
            MetricsSubcommand::Reset { force } => {
                if !force {
                    return Err("Refusing to delete all weigh-ins without --force".into());
                }
                ctx.metrics().reset().await?;
                println!("Deleted all weigh-ins");
                Ok(())
            }
            MetricsSubcommand::Trend { days } => {
                let since = window_start(Local::now().date_naive(), *days)?;
                match ctx.metrics().trend(since).await? {
                    Some(trend) => {
                        println!(
                            "{} to {}: {:.1} kg -> {:.1} kg ({:+.1} kg over {} weigh-ins)",
                            trend.from,
                            trend.to,
                            trend.start_kg,
                            trend.end_kg,
                            trend.change_kg,
                            trend.readings
                        );
                    }
                    None => println!("Not enough weigh-ins in the last {} days", days),
                }
                Ok(())
            }
        }
    }

    async fn import(
        &self,
        ctx: &Context,
        file: &Path,
        source: Option<&str>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let source = source
            .map(|s| s.parse::<MetricSource>())
            .transpose()?;

        let contents = std::fs::read_to_string(file)
            .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
        let values = batch_from_json(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", file.display(), e))?;

        let report = match ctx.metrics().import_json(values, source).await {
            Ok(report) => report,
            Err(ImportError::Persist {
                summary,
                rejected,
                source: e,
                ..
            }) => {
                eprintln!("Warning: import was not saved ({})", summary);
                for r in &rejected {
                    eprintln!("  skipped {}", r);
                }
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        let now = Utc::now();
        for source in &report.sources {
            ctx.app_state().record_import(*source, now).await?;
        }

        println!("{}", report.summary);
        for rejected in &report.rejected {
            println!("  skipped {}", rejected);
        }
        Ok(())
    }
}
