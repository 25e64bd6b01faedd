//! Data models for student records
//!
//! This module provides:
//! - Student records as returned by the record store
//! - Opaque student identifiers
//! - The fixed set of class labels (`{10,11,12}A{1,2,3}`)
//! - Active/Inactive status
//! - Raw field values as typed into the form

use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grades a class label can belong to
pub const CLASS_GRADES: [u8; 3] = [10, 11, 12];

/// Sections within each grade
pub const CLASS_SECTIONS: [u8; 3] = [1, 2, 3];

/// Opaque student identifier
///
/// Empty for an unsaved draft; always non-empty on a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl StudentId {
    /// Generate a fresh identifier for a newly persisted record
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Check if the identifier is empty (draft, not yet persisted)
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Borrow the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StudentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Class label of the form `{grade}A{section}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassLabel {
    grade: u8,
    section: u8,
}

impl ClassLabel {
    /// Create a class label, returning None outside the fixed grade/section set
    pub fn new(grade: u8, section: u8) -> Option<Self> {
        if CLASS_GRADES.contains(&grade) && CLASS_SECTIONS.contains(&section) {
            Some(Self { grade, section })
        } else {
            None
        }
    }

    /// All nine class labels, grade-major (10A1, 10A2, ..., 12A3)
    pub fn all() -> Vec<Self> {
        CLASS_GRADES
            .iter()
            .flat_map(|&grade| {
                CLASS_SECTIONS
                    .iter()
                    .map(move |&section| Self { grade, section })
            })
            .collect()
    }

    /// Grade number (10, 11 or 12)
    pub fn grade(&self) -> u8 {
        self.grade
    }

    /// Section number (1, 2 or 3)
    pub fn section(&self) -> u8 {
        self.section
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}A{}", self.grade, self.section)
    }
}

impl FromStr for ClassLabel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidClassLabel(s.to_string());
        let (grade, section) = s.trim().split_once('A').ok_or_else(invalid)?;
        let grade: u8 = grade.parse().map_err(|_| invalid())?;
        let section: u8 = section.parse().map_err(|_| invalid())?;
        Self::new(grade, section).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ClassLabel {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClassLabel> for String {
    fn from(value: ClassLabel) -> Self {
        value.to_string()
    }
}

/// Enrollment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Currently enrolled
    Active,
    /// No longer enrolled
    Inactive,
}

impl Status {
    /// All statuses in display order
    pub fn all() -> [Status; 2] {
        [Status::Active, Status::Inactive]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => write!(f, "Active"),
            Status::Inactive => write!(f, "Inactive"),
        }
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" => Ok(Status::Active),
            "Inactive" => Ok(Status::Inactive),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// A persisted student record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Store-assigned identifier (never empty)
    pub id: StudentId,
    /// Full name
    pub name: String,
    /// Contact email, validated by the store
    pub email: String,
    /// Date of birth
    pub date_of_birth: NaiveDate,
    /// Class label
    pub class_label: ClassLabel,
    /// Enrollment status
    pub status: Status,
}

impl Student {
    /// Copy the record's values into raw field form
    pub fn fields(&self) -> StudentFields {
        StudentFields {
            name: self.name.clone(),
            email: self.email.clone(),
            date_of_birth: self.date_of_birth.format("%Y-%m-%d").to_string(),
            class_name: self.class_label.to_string(),
            status: self.status.to_string(),
        }
    }
}

/// The full, unfiltered sequence of records last fetched from the store
pub type RecordSet = Vec<Student>;

/// Raw field values as entered in the form
///
/// This is what crosses into the record store on create/update; parsing and
/// validation of the values is the store's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFields {
    /// Name text
    pub name: String,
    /// Email text
    pub email: String,
    /// ISO date text (`YYYY-MM-DD`)
    pub date_of_birth: String,
    /// Class label text
    pub class_name: String,
    /// Status text
    pub status: String,
}

impl StudentFields {
    /// Field display names paired with their current values, in form order
    pub fn labelled(&self) -> [(&'static str, &str); 5] {
        [
            ("Name", self.name.as_str()),
            ("Email", self.email.as_str()),
            ("Date of Birth", self.date_of_birth.as_str()),
            ("Class", self.class_name.as_str()),
            ("Status", self.status.as_str()),
        ]
    }

    /// The first field that is empty after trimming, if any
    pub fn first_missing(&self) -> Option<&'static str> {
        self.labelled()
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| label)
    }

    /// Check if every field is empty
    pub fn is_blank(&self) -> bool {
        self.labelled()
            .iter()
            .all(|(_, value)| value.is_empty())
    }
}
