//! RosterKit Settings Crate
//!
//! Handles application configuration: the store backend, the list's initial
//! criteria, report export and logging.

pub mod config;
pub mod error;

pub use config::{
    Config, ExportFormat, ExportSettings, ListSettings, LoggingSettings, StoreBackend,
    StoreSettings,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
