//! Message type carried by the roster message bus.
//!
//! One tagged message type for the whole screen. Subscribers match it
//! exhaustively, so a new variant is a compile error at every subscriber
//! until it is handled.

use serde::{Deserialize, Serialize};

use crate::data::Student;

/// Notification exchanged between the form and the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterEvent {
    /// A create, update or delete completed successfully; the record set
    /// must be refetched.
    Added,
    /// The list asked the form to edit this record.
    Edited(Student),
    /// The list asked the form to delete this record.
    DeleteRequested(Student),
}

impl RosterEvent {
    /// Get the tag of this event
    pub fn kind(&self) -> RosterEventKind {
        match self {
            RosterEvent::Added => RosterEventKind::Added,
            RosterEvent::Edited(_) => RosterEventKind::Edited,
            RosterEvent::DeleteRequested(_) => RosterEventKind::DeleteRequested,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            RosterEvent::Added => "Student data changed".to_string(),
            RosterEvent::Edited(s) => format!("Edit requested for {} ({})", s.name, s.id),
            RosterEvent::DeleteRequested(s) => {
                format!("Delete requested for {} ({})", s.name, s.id)
            }
        }
    }
}

/// Event tag without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RosterEventKind {
    /// Data changed.
    Added,
    /// Edit requested.
    Edited,
    /// Delete requested.
    DeleteRequested,
}

impl std::fmt::Display for RosterEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterEventKind::Added => write!(f, "added"),
            RosterEventKind::Edited => write!(f, "edited"),
            RosterEventKind::DeleteRequested => write!(f, "deleteRequested"),
        }
    }
}
