//! Filter engine for the student list
//!
//! Composes a free-text search with exact-match class and status filters.
//! Predicates run in a fixed order (search, class, status), each one a
//! stable filter over the previous stage's output, so the result keeps the
//! input's relative order.

use crate::data::{ClassLabel, Status, Student};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Class constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassFilter {
    /// No constraint
    #[default]
    Any,
    /// Only this class
    Only(ClassLabel),
}

impl ClassFilter {
    /// Check if a class label passes this filter
    pub fn accepts(&self, label: ClassLabel) -> bool {
        match self {
            ClassFilter::Any => true,
            ClassFilter::Only(wanted) => *wanted == label,
        }
    }
}

impl fmt::Display for ClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassFilter::Any => write!(f, "any"),
            ClassFilter::Only(label) => write!(f, "{}", label),
        }
    }
}

impl FromStr for ClassFilter {
    type Err = ValidationError;

    /// Empty text or `any` means no constraint
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("any") {
            Ok(ClassFilter::Any)
        } else {
            s.parse().map(ClassFilter::Only)
        }
    }
}

/// Status constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    /// No constraint
    #[default]
    Any,
    /// Only this status
    Only(Status),
}

impl StatusFilter {
    /// Check if a status passes this filter
    pub fn accepts(&self, status: Status) -> bool {
        match self {
            StatusFilter::Any => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::Any => write!(f, "any"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ValidationError;

    /// Empty text or `any` means no constraint
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("any") {
            Ok(StatusFilter::Any)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Criteria currently applied to the list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Case-insensitive substring matched against name or email
    pub search_text: String,
    /// Exact class match
    pub class_filter: ClassFilter,
    /// Exact status match
    pub status_filter: StatusFilter,
}

impl FilterCriteria {
    /// Criteria with no constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the search text
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Builder: set the class filter
    pub fn with_class(mut self, filter: ClassFilter) -> Self {
        self.class_filter = filter;
        self
    }

    /// Builder: set the status filter
    pub fn with_status(mut self, filter: StatusFilter) -> Self {
        self.status_filter = filter;
        self
    }

    /// Normalized search term, None when the search imposes no constraint
    fn search_term(&self) -> Option<String> {
        let term = self.search_text.trim();
        if term.is_empty() {
            None
        } else {
            Some(term.to_lowercase())
        }
    }

    /// Check if these criteria constrain nothing
    pub fn is_unconstrained(&self) -> bool {
        self.search_term().is_none()
            && self.class_filter == ClassFilter::Any
            && self.status_filter == StatusFilter::Any
    }

    /// Check if a student passes the search predicate
    pub fn matches_search(&self, student: &Student) -> bool {
        match self.search_term() {
            None => true,
            Some(term) => contains_term(student, &term),
        }
    }

    /// Check if a student passes the class predicate
    pub fn matches_class(&self, student: &Student) -> bool {
        self.class_filter.accepts(student.class_label)
    }

    /// Check if a student passes the status predicate
    pub fn matches_status(&self, student: &Student) -> bool {
        self.status_filter.accepts(student.status)
    }

    /// Check if a student passes all three predicates
    pub fn matches(&self, student: &Student) -> bool {
        self.matches_search(student) && self.matches_class(student) && self.matches_status(student)
    }
}

fn contains_term(student: &Student, term_lower: &str) -> bool {
    student.name.to_lowercase().contains(term_lower)
        || student.email.to_lowercase().contains(term_lower)
}

/// Apply criteria to a record set
///
/// Pure and stable: the same inputs always give the same output, in the
/// input's relative order.
pub fn apply(records: &[Student], criteria: &FilterCriteria) -> Vec<Student> {
    let searched: Vec<&Student> = match criteria.search_term() {
        None => records.iter().collect(),
        Some(term) => records.iter().filter(|s| contains_term(s, &term)).collect(),
    };

    searched
        .into_iter()
        .filter(|s| criteria.matches_class(s))
        .filter(|s| criteria.matches_status(s))
        .cloned()
        .collect()
}
