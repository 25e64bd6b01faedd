//! Error handling for RosterKit
//!
//! Provides the error taxonomy shared by every layer of the roster screen:
//! - Validation errors (local precondition failures, never reach the store)
//! - Remote errors (the record store rejected a create/update/delete/list)
//! - Load errors (the list call behind the query cache failed)
//!
//! All error types use `thiserror` for ergonomic error handling.

use crate::data::StudentId;
use thiserror::Error;

/// Local precondition failure
///
/// Raised by the controllers before any remote call is issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An operation needed a record identifier and none could be resolved
    #[error("No student selected to {operation}")]
    MissingIdentifier {
        /// The operation that needed the identifier.
        operation: &'static str,
    },

    /// A required draft field is empty
    #[error("{field} is required")]
    MissingField {
        /// Display name of the empty field.
        field: &'static str,
    },

    /// Text that is not one of the nine class labels
    #[error("Invalid class label: {0}")]
    InvalidClassLabel(String),

    /// Text that is not a known status
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// A row action referenced a record that is not in the current record set
    #[error("Student {0} is not in the current list")]
    UnknownRecord(StudentId),

    /// A mutation was submitted while another one is still in flight
    #[error("Another request is still in progress")]
    Busy,
}

/// A record store rejection, normalized to a single message
///
/// Every backend failure is converted into this shape at the store boundary,
/// so controllers only ever see a message they can show verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    /// Message surfaced to the user as-is.
    pub message: String,
}

impl RemoteError {
    /// Create a remote error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The list call failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to load students: {message}")]
pub struct LoadError {
    /// The underlying failure message.
    pub message: String,
}

impl LoadError {
    /// Create a load error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<RemoteError> for LoadError {
    fn from(value: RemoteError) -> Self {
        Self {
            message: value.message,
        }
    }
}

/// Main error type for RosterKit
///
/// A unified error type that can represent any error raised by the screen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// Local precondition failure
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Record store rejected a call
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// List call failed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The owning component was torn down while the call was in flight;
    /// its result was discarded.
    #[error("Component was torn down before the call completed")]
    Unmounted,
}

impl RosterError {
    /// Check if this is a local validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, RosterError::Validation(_))
    }

    /// Check if this is a record store rejection
    pub fn is_remote(&self) -> bool {
        matches!(self, RosterError::Remote(_))
    }

    /// Check if this is a list load failure
    pub fn is_load(&self) -> bool {
        matches!(self, RosterError::Load(_))
    }

    /// Message suitable for display next to the form or the list
    pub fn user_message(&self) -> String {
        match self {
            RosterError::Remote(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type using RosterError
pub type Result<T> = std::result::Result<T, RosterError>;
