use clap::{Args, Subcommand};
use fitvault_core::{Context, Units};

#[derive(Args)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub command: ProfileSubcommand,
}

#[derive(Subcommand)]
pub enum ProfileSubcommand {
    /// Show profile and import history
    Show,

    /// Update profile fields
    Set {
        #[arg(long)]
        name: Option<String>,

        /// Height in centimetres
        #[arg(long)]
        height: Option<f64>,

        /// Goal weight in kilograms
        #[arg(long)]
        goal_weight: Option<f64>,

        /// Display units (metric, imperial)
        #[arg(long)]
        units: Option<String>,
    },
}

impl ProfileCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        let repo = ctx.app_state();

        match &self.command {
            ProfileSubcommand::Show => {
                let state = repo.load().await?;

                let Some(profile) = &state.profile else {
                    println!("No profile yet. Use 'fitvault profile set --name <NAME>'.");
                    return Ok(());
                };

                println!("Name: {}", profile.name);
                if let Some(h) = profile.height_cm {
                    println!("Height: {:.0} cm", h);
                }
                if let Some(g) = profile.goal_weight_kg {
                    println!("Goal weight: {:.1} kg", g);
                }
                println!("Units: {}", profile.units);

                if let Some(latest) = ctx.metrics().latest().await? {
                    print!("Latest weight: {:.1} kg", latest.weight_kg);
                    if let Some(bmi) = profile.bmi(latest.weight_kg) {
                        print!(" (BMI {:.1})", bmi);
                    }
                    println!();
                    if let Some(goal) = profile.goal_weight_kg {
                        println!("To goal: {:+.1} kg", goal - latest.weight_kg);
                    }
                }

                if !state.last_import.is_empty() {
                    println!("\nLast imports:");
                    for (source, at) in &state.last_import {
                        println!("  {:14} {}", source.to_string(), at.to_rfc3339());
                    }
                }
                Ok(())
            }
            ProfileSubcommand::Set {
                name,
                height,
                goal_weight,
                units,
            } => {
                let mut profile = repo.load().await?.profile.unwrap_or_default();

                if let Some(n) = name {
                    profile.name = n.clone();
                }
                if height.is_some() {
                    profile.height_cm = *height;
                }
                if goal_weight.is_some() {
                    profile.goal_weight_kg = *goal_weight;
                }
                if let Some(u) = units {
                    profile.units = u.parse::<Units>()?;
                }
                if profile.name.is_empty() {
                    return Err("A profile needs a name; pass --name".into());
                }

                let saved = repo.update_profile(profile).await?;
                if let Some(p) = &saved.profile {
                    println!("Saved profile for {}", p.name);
                }
                Ok(())
            }
        }
    }
}
