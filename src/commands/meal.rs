use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use fitvault_core::{Context, Meal, MealType, Nutrition};
use uuid::Uuid;

use super::{date_range, parse_date, OutputFormat};

#[derive(Args)]
pub struct MealCommand {
    #[command(subcommand)]
    pub command: MealSubcommand,
}

#[derive(Subcommand)]
pub enum MealSubcommand {
    /// Log a meal
    Log {
        /// What was eaten
        name: String,

        /// Meal type (breakfast, lunch, dinner, snack)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        meal_type: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Calories (kcal)
        #[arg(long, default_value_t = 0.0)]
        calories: f64,

        /// Protein (g)
        #[arg(long, default_value_t = 0.0)]
        protein: f64,

        /// Carbohydrates (g)
        #[arg(long, default_value_t = 0.0)]
        carbs: f64,

        /// Fat (g)
        #[arg(long, default_value_t = 0.0)]
        fat: f64,

        /// Add notes to the log
        #[arg(long)]
        notes: Option<String>,
    },

    /// View meal history
    History {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Start date (YYYY-MM-DD), defaults to 7 days ago
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,
    },

    /// Show nutrition totals for a day
    Totals {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Delete a logged meal
    Delete {
        /// Date the meal was logged on (YYYY-MM-DD)
        date: String,

        /// Meal ID (UUID)
        id: String,
    },
}

fn date_or_today(date: &Option<String>) -> Result<NaiveDate, String> {
    match date {
        Some(d) => parse_date(d),
        None => Ok(Local::now().date_naive()),
    }
}

impl MealCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        let repo = ctx.meals();

        match &self.command {
            MealSubcommand::Log {
                name,
                meal_type,
                date,
                calories,
                protein,
                carbs,
                fat,
                notes,
            } => {
                let date = date_or_today(date)?;
                let meal_type: MealType = meal_type.parse()?;

                let mut meal = Meal::new(date, meal_type, name).with_nutrition(Nutrition {
                    calories: *calories,
                    protein_g: *protein,
                    carbs_g: *carbs,
                    fat_g: *fat,
                });
                if let Some(n) = notes {
                    meal = meal.with_notes(n);
                }

                let logged = repo.log(&meal).await?;
                println!("Logged {} on {}: {}", logged.meal_type, logged.date, logged.name);
                println!("  {}", logged.nutrition);
                println!();
                println!("Meal ID: {}", logged.id);
                Ok(())
            }
            MealSubcommand::History { format, from, to } => {
                let (from, to) = date_range(from, to, 7)?;
                let meals = repo.list_range(from, to).await?;

                if meals.is_empty() {
                    println!("No meal history found for {} to {}", from, to);
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&meals)?);
                    }
                    OutputFormat::Text => {
                        let mut current_date: Option<NaiveDate> = None;

                        for meal in &meals {
                            // Print date header when it changes
                            if current_date != Some(meal.date) {
                                if current_date.is_some() {
                                    println!();
                                }
                                println!("{}", meal.date);
                                println!("{}", "-".repeat(10));
                                current_date = Some(meal.date);
                            }

                            println!(
                                "  {:10} {} ({:.0} kcal)",
                                meal.meal_type, meal.name, meal.nutrition.calories
                            );

                            if let Some(notes) = &meal.notes {
                                println!("             Notes: {}", notes);
                            }
                        }

                        println!("\nTotal: {} meal(s)", meals.len());
                    }
                }
                Ok(())
            }
            MealSubcommand::Totals { date } => {
                let date = date_or_today(date)?;
                let totals = repo.daily_totals(date).await?;
                println!("{}: {}", date, totals);
                Ok(())
            }
            MealSubcommand::Delete { date, id } => {
                let date = parse_date(date)?;
                let uuid = Uuid::parse_str(id).map_err(|_| format!("Invalid meal UUID: {}", id))?;
                if !repo.delete(date, uuid).await? {
                    return Err(format!("Meal not found on {}: {}", date, id).into());
                }
                println!("Deleted meal {}", id);
                Ok(())
            }
        }
    }
}
