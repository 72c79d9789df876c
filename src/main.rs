use clap::{Parser, Subcommand};
use fitvault_core::Context;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{ConfigCommand, MealCommand, MetricsCommand, ProfileCommand, WorkoutCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "fitvault")]
#[command(version)]
#[command(about = "Personal fitness records: weigh-ins, workouts and meals", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record and import body metrics
    Metrics(MetricsCommand),

    /// Plan and track workouts
    Workout(WorkoutCommand),

    /// Log meals
    Meal(MealCommand),

    /// Manage your profile
    Profile(ProfileCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitvault=warn,fitvault_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.clone())?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config, cli.config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    tracing::debug!(
        storage = %config.storage.value,
        config_file = ?config.config_file,
        "Loaded configuration"
    );
    let ctx = Context::open(&config.backend()).await?;

    let result = match command {
        Commands::Metrics(cmd) => cmd.run(&ctx).await,
        Commands::Workout(cmd) => cmd.run(&ctx).await,
        Commands::Meal(cmd) => cmd.run(&ctx).await,
        Commands::Profile(cmd) => cmd.run(&ctx).await,
        Commands::Config(_) => Ok(()),
    };

    ctx.close().await;
    result
}
