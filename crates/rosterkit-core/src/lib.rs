//! # RosterKit Core
//!
//! Core types and utilities for RosterKit.
//! Provides the student data model, the filter engine applied to the list
//! screen, the process-local message bus shared by the screen components,
//! and the error taxonomy every other crate reports through.

pub mod data;
pub mod error;
pub mod event_bus;
pub mod filter;

pub use data::{
    ClassLabel, RecordSet, Status, Student, StudentFields, StudentId, CLASS_GRADES,
    CLASS_SECTIONS,
};

pub use error::{LoadError, RemoteError, Result, RosterError, ValidationError};

pub use event_bus::{MessageBus, RosterEvent, RosterEventKind, SubscriptionId};

pub use filter::{apply as apply_filter, ClassFilter, FilterCriteria, StatusFilter};
