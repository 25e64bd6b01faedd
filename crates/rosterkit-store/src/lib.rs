//! # RosterKit Store
//!
//! The record store behind the roster screen. `RecordStore` is the only
//! surface the controllers talk to; every backend failure is normalized to
//! `RemoteError` before it leaves this crate.

pub mod error;
pub mod json_file;
pub mod memory;
pub mod traits;
pub mod validation;

pub use error::{StoreError, StoreResult};
pub use json_file::JsonFileStore;
pub use memory::{demo_records, MemoryStore};
pub use traits::{RecordStore, RemoteResult};
pub use validation::{validate_fields, ValidatedFields};
