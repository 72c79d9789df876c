use clap::{Args, Subcommand};
use fitvault_core::{Context, Exercise, Workout};
use uuid::Uuid;

use super::{date_range, parse_date, OutputFormat};

#[derive(Args)]
pub struct WorkoutCommand {
    #[command(subcommand)]
    pub command: WorkoutSubcommand,
}

#[derive(Subcommand)]
pub enum WorkoutSubcommand {
    /// Plan a workout
    Create {
        /// Workout name
        name: String,

        /// Date (YYYY-MM-DD)
        #[arg(long, short)]
        date: String,

        /// Exercise as name:sets:reps[:weight] (can be repeated)
        #[arg(long = "exercise", short = 'e', value_name = "EXERCISE")]
        exercises: Vec<String>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List workouts
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Start date (YYYY-MM-DD), defaults to 7 days before --to
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,
    },

    /// Show a workout
    Show {
        /// Workout ID (UUID)
        id: String,
    },

    /// Mark a workout as done
    Complete {
        /// Workout ID (UUID)
        id: String,
    },

    /// Delete a workout
    Delete {
        /// Workout ID (UUID)
        id: String,
    },
}

fn parse_id(id: &str) -> Result<Uuid, String> {
    Uuid::parse_str(id).map_err(|_| format!("Invalid workout UUID: {}", id))
}

impl WorkoutCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        let repo = ctx.workouts();

        match &self.command {
            WorkoutSubcommand::Create {
                name,
                date,
                exercises,
                notes,
            } => {
                let date = parse_date(date)?;
                let exercises = exercises
                    .iter()
                    .map(|e| e.parse::<Exercise>())
                    .collect::<Result<Vec<_>, _>>()?;

                let mut workout = Workout::new(name, date).with_exercises(exercises);
                if let Some(n) = notes {
                    workout = workout.with_notes(n);
                }

                let created = repo.create(&workout).await?;
                println!("Created workout:");
                println!();
                print!("{}", created);
                println!();
                println!("Workout ID: {}", created.id);
                Ok(())
            }
            WorkoutSubcommand::List { format, from, to } => {
                let (from, to) = date_range(from, to, 7)?;
                let workouts = repo.list_range(from, to).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&workouts)?);
                    }
                    OutputFormat::Text => {
                        if workouts.is_empty() {
                            println!("No workouts found for {} to {}", from, to);
                            return Ok(());
                        }
                        for w in &workouts {
                            let mark = if w.completed { "x" } else { " " };
                            println!(
                                "[{}] {}  {:30} {} exercise(s)  {}",
                                mark,
                                w.date,
                                w.name,
                                w.exercises.len(),
                                w.id
                            );
                        }
                        println!("\nTotal: {} workout(s)", workouts.len());
                    }
                }
                Ok(())
            }
            WorkoutSubcommand::Show { id } => {
                let workout = repo
                    .get_by_id(parse_id(id)?)
                    .await?
                    .ok_or_else(|| format!("Workout not found: {}", id))?;
                print!("{}", workout);
                let volume = workout.total_volume_kg();
                if volume > 0.0 {
                    println!("\nVolume: {:.0} kg", volume);
                }
                Ok(())
            }
            WorkoutSubcommand::Complete { id } => {
                let workout = repo
                    .set_completed(parse_id(id)?, true)
                    .await?
                    .ok_or_else(|| format!("Workout not found: {}", id))?;
                println!("Completed '{}' ({})", workout.name, workout.date);
                Ok(())
            }
            WorkoutSubcommand::Delete { id } => {
                if !repo.delete(parse_id(id)?).await? {
                    return Err(format!("Workout not found: {}", id).into());
                }
                println!("Deleted workout {}", id);
                Ok(())
            }
        }
    }
}
