use fitvault_core::BackendConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Which record store backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Sqlite,
    Files,
    Memory,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Sqlite => write!(f, "sqlite"),
            StorageKind::Files => write!(f, "files"),
            StorageKind::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StorageKind::Sqlite),
            "files" => Ok(StorageKind::Files),
            "memory" => Ok(StorageKind::Memory),
            _ => Err(format!(
                "Invalid storage '{}'. Valid options: sqlite, files, memory",
                s
            )),
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Record store backend
    pub storage: ConfigValue<StorageKind>,
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Root directory for the file backend
    pub data_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    storage: Option<StorageKind>,
    database_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
}

/// Resolves relative paths against the config file's directory
fn resolve(config_path: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        config_path
            .parent()
            .map(|p| p.join(&path))
            .unwrap_or(path)
    } else {
        path
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut storage = ConfigValue::new(StorageKind::Sqlite, ConfigSource::Default);
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("fitvault.db"),
            ConfigSource::Default,
        );
        let mut data_dir = ConfigValue::new(
            Self::default_data_dir().join("records"),
            ConfigSource::Default,
        );
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(kind) = file_config.storage {
                storage = ConfigValue::new(kind, ConfigSource::File);
            }
            if let Some(db_path) = file_config.database_path {
                database_path = ConfigValue::new(resolve(&path, db_path), ConfigSource::File);
            }
            if let Some(dir) = file_config.data_dir {
                data_dir = ConfigValue::new(resolve(&path, dir), ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(kind) = std::env::var("FITVAULT_STORAGE") {
            let kind = kind
                .parse()
                .map_err(|e| ConfigError::InvalidValue("FITVAULT_STORAGE".into(), e))?;
            storage = ConfigValue::new(kind, ConfigSource::Environment);
        }
        if let Ok(db_path) = std::env::var("FITVAULT_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(dir) = std::env::var("FITVAULT_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }

        Ok(Self {
            storage,
            database_path,
            data_dir,
            config_file,
        })
    }

    /// Backend selection for the record store
    pub fn backend(&self) -> BackendConfig {
        match self.storage.value {
            StorageKind::Sqlite => BackendConfig::Sqlite(self.database_path.value.clone()),
            StorageKind::Files => BackendConfig::Files(self.data_dir.value.clone()),
            StorageKind::Memory => BackendConfig::Memory,
        }
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/fitvault/
    /// - macOS: ~/Library/Application Support/fitvault/
    /// - Windows: %APPDATA%/fitvault/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitvault")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/fitvault/
    /// - macOS: ~/Library/Application Support/fitvault/
    /// - Windows: %APPDATA%/fitvault/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitvault")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, e) => write!(f, "Invalid {}: {}", name, e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError(_, e) => Some(e),
            ConfigError::ParseError(_, e) => Some(e),
            ConfigError::InvalidValue(_, _) => None,
        }
    }
}
