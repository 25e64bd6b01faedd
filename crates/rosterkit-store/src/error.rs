//! Error types for the record store crate.
//!
//! `StoreError` is internal to the backends. It is converted into the
//! single `RemoteError { message }` shape at the `RecordStore` boundary.

use rosterkit_core::{RemoteError, StudentId};
use std::io;
use thiserror::Error;

/// Errors raised inside a record store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record with this identifier exists.
    #[error("Student not found: {0}")]
    NotFound(StudentId),

    /// A field value was rejected by backend validation.
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        /// Display name of the rejected field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// I/O error while reading or writing the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backing file could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Shorthand for a field rejection
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        StoreError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for RemoteError {
    fn from(err: StoreError) -> Self {
        RemoteError::new(err.to_string())
    }
}

/// Result type alias for backend operations.
pub type StoreResult<T> = Result<T, StoreError>;
