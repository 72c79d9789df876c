use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::OutputFormat;
use crate::config::Config;

const DEFAULT_CONFIG: &str = r#"# fitvault configuration

# Record store backend: sqlite, files or memory
storage: sqlite

# Path to SQLite database (default: platform data dir/fitvault/fitvault.db)
# database_path: fitvault.db

# Root directory for the files backend
# data_dir: records
"#;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        cli_config_path: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("storage: {}", config.storage.value);
                        println!("  source: {}", config.storage.source);
                        println!();

                        println!("database_path: {}", config.database_path.value.display());
                        println!("  source: {}", config.database_path.source);
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = cli_config_path.unwrap_or_else(Config::default_config_path);

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'fitvault config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(DEFAULT_CONFIG.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageKind;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_template_parses() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, DEFAULT_CONFIG).unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.storage.value, StorageKind::Sqlite);
    }

    #[test]
    fn test_init_writes_file_once() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.yaml");
        let config = Config::load(Some(config_path.clone())).unwrap();

        let cmd = ConfigCommand {
            command: ConfigSubcommand::Init,
        };
        cmd.run(&config, Some(config_path.clone())).unwrap();
        assert!(config_path.exists());

        std::fs::write(&config_path, "storage: files\n").unwrap();
        cmd.run(&config, Some(config_path.clone())).unwrap();
        assert_eq!(
            std::fs::read_to_string(&config_path).unwrap(),
            "storage: files\n"
        );
    }
}
