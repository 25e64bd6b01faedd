//! # RosterKit
//!
//! Student roster management: a form to add, edit and delete students and a
//! list that searches, filters and exports them. The two components stay in
//! sync through a typed message bus and a query cache that refetches after
//! every confirmed change.
//!
//! ## Architecture
//!
//! RosterKit is organized as a workspace with multiple crates:
//!
//! 1. **rosterkit-core** - Student model, filter engine, message bus, errors
//! 2. **rosterkit-store** - Record store interface, memory and JSON file backends
//! 3. **rosterkit-settings** - Configuration file handling
//! 4. **rosterkit-ui** - Query cache, form and list controllers, reports, console
//! 5. **rosterkit** - Main binary that integrates all crates

pub use rosterkit_core::{
    apply_filter, ClassFilter, ClassLabel, FilterCriteria, LoadError, MessageBus, RecordSet,
    RemoteError, RosterError, RosterEvent, Status, StatusFilter, Student, StudentFields,
    StudentId, ValidationError,
};

pub use rosterkit_settings::{
    Config, ExportFormat, ExportSettings, ListSettings, LoggingSettings, StoreBackend,
    StoreSettings,
};

pub use rosterkit_store::{demo_records, JsonFileStore, MemoryStore, RecordStore, StoreError};

pub use rosterkit_ui::{
    console_app, exporter_for, write_report, DeleteTarget, ExportRequest, FormController,
    FormMode, ListController, QueryCache, QueryStatus, ReportExporter, RosterScreen, RowAction,
};

use std::sync::Arc;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging from the logging settings
///
/// Sets up structured logging with:
/// - Output on stderr, so it never interleaves with console output
/// - RUST_LOG environment variable support, falling back to `settings.level`
/// - Pretty or JSON formatting
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if settings.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true);
        registry.with(fmt_layer).try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_names(true)
            .with_line_number(true)
            .pretty();
        registry.with(fmt_layer).try_init()?;
    }

    Ok(())
}

/// Open the record store the settings describe
///
/// Seeds the store with demo students when asked and it is empty.
pub async fn open_store(settings: &StoreSettings) -> anyhow::Result<Arc<dyn RecordStore>> {
    use anyhow::Context;

    match settings.backend {
        StoreBackend::Memory => {
            let store = if settings.seed_demo_data {
                MemoryStore::with_demo_data()
            } else {
                MemoryStore::new()
            };
            tracing::info!("Using in-memory store");
            Ok(Arc::new(store))
        }
        StoreBackend::JsonFile => {
            let store = JsonFileStore::open(&settings.data_path)
                .await
                .with_context(|| {
                    format!("Failed to open student file {}", settings.data_path.display())
                })?;
            if settings.seed_demo_data && store.seed_if_empty(demo_records()).await? {
                tracing::info!("Seeded {} with demo students", store.path().display());
            }
            Ok(Arc::new(store))
        }
    }
}
