//! Configuration and settings management for RosterKit
//!
//! Provides configuration file handling and validation.
//! Supports JSON and TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - Store settings (backend, data file, demo seeding)
//! - List defaults (initial search text and filters)
//! - Report export (format, title, output directory)
//! - Logging (level, JSON output)

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use rosterkit_core::{ClassFilter, FilterCriteria, StatusFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "rosterkit";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Record store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Records live only as long as the process
    Memory,
    /// Records persisted to a JSON file
    #[default]
    JsonFile,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::JsonFile => write!(f, "json_file"),
        }
    }
}

/// Record store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Which backend to use
    pub backend: StoreBackend,
    /// File used by the JSON backend
    pub data_path: PathBuf,
    /// Seed an empty store with sample students
    pub seed_demo_data: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            data_path: app_dir().join("students.json"),
            seed_demo_data: false,
        }
    }
}

/// Initial filter criteria for the student list
///
/// Empty text means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListSettings {
    pub search_text: String,
    pub class_filter: String,
    pub status_filter: String,
}

impl ListSettings {
    /// Parse into filter criteria
    pub fn criteria(&self) -> ConfigResult<FilterCriteria> {
        let class_filter: ClassFilter = self
            .class_filter
            .parse()
            .map_err(|e: rosterkit_core::ValidationError| {
                ConfigError::invalid("list.class_filter", e.to_string())
            })?;
        let status_filter: StatusFilter = self
            .status_filter
            .parse()
            .map_err(|e: rosterkit_core::ValidationError| {
                ConfigError::invalid("list.status_filter", e.to_string())
            })?;

        Ok(FilterCriteria {
            search_text: self.search_text.clone(),
            class_filter,
            status_filter,
        })
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Fixed-width text table
    #[default]
    Text,
    /// JSON document
    Json,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Report export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,
    /// Title printed at the top of the report
    pub title: String,
    /// Directory reports are written to
    pub output_directory: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            title: "Student Roster".to_string(),
            output_directory: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub store: StoreSettings,
    pub list: ListSettings,
    pub export: ExportSettings,
    pub logging: LoggingSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location: `<config dir>/rosterkit/config.toml`
    pub fn default_path() -> PathBuf {
        app_dir().join("config.toml")
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from file, or defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e))
                })?;
            }
        }
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.store.backend == StoreBackend::JsonFile
            && self.store.data_path.as_os_str().is_empty()
        {
            return Err(ConfigError::invalid(
                "store.data_path",
                "required for the json_file backend",
            ));
        }

        self.list.criteria()?;

        if self.export.title.trim().is_empty() {
            return Err(ConfigError::invalid("export.title", "must not be empty"));
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("'{}' is not one of {}", self.logging.level, LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }
}
