//! # RosterKit UI
//!
//! The roster screen: a form that creates, edits and deletes students and a
//! list that shows, filters and exports them. The two never reference each
//! other; they meet on a `MessageBus` and the list reads records through a
//! `QueryCache`.

pub mod console_app;
pub mod form_controller;
pub mod list_controller;
pub mod query_cache;
pub mod report;
pub mod screen;

pub use form_controller::{DeleteTarget, FormController, FormMode, FormState, SelectOption};
pub use list_controller::{ColumnDef, ColumnKind, ListController, RowAction, COLUMNS};
pub use query_cache::{QueryCache, QuerySnapshot, QueryStatus, Refresh, UpdateSubscription};
pub use report::{
    exporter_for, write_report, ExportError, ExportRequest, JsonReportExporter, ReportExporter,
    TextReportExporter,
};
pub use screen::RosterScreen;
