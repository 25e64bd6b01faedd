//! Backend-side validation of raw field values
//!
//! The controllers only check that fields are present. Everything else is
//! enforced here, the way an authoritative backend would.

use crate::error::{StoreError, StoreResult};
use chrono::NaiveDate;
use email_address::EmailAddress;
use rosterkit_core::{ClassLabel, Status, Student, StudentFields, StudentId};

/// Field values that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFields {
    pub name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub class_label: ClassLabel,
    pub status: Status,
}

impl ValidatedFields {
    /// Attach an identifier to produce a record
    pub fn into_student(self, id: StudentId) -> Student {
        Student {
            id,
            name: self.name,
            email: self.email,
            date_of_birth: self.date_of_birth,
            class_label: self.class_label,
            status: self.status,
        }
    }
}

/// Validate raw form values
pub fn validate_fields(fields: &StudentFields) -> StoreResult<ValidatedFields> {
    let name = fields.name.trim();
    if name.is_empty() {
        return Err(StoreError::invalid("name", "name must not be empty"));
    }

    let email = fields.email.trim();
    if !EmailAddress::is_valid(email) {
        return Err(StoreError::invalid(
            "email",
            format!("'{}' is not a valid email address", email),
        ));
    }

    let date_of_birth = NaiveDate::parse_from_str(fields.date_of_birth.trim(), "%Y-%m-%d")
        .map_err(|_| {
            StoreError::invalid(
                "date of birth",
                format!("'{}' is not a date (expected YYYY-MM-DD)", fields.date_of_birth),
            )
        })?;

    let class_label: ClassLabel = fields
        .class_name
        .parse()
        .map_err(|e: rosterkit_core::ValidationError| StoreError::invalid("class", e.to_string()))?;

    let status: Status = fields
        .status
        .parse()
        .map_err(|e: rosterkit_core::ValidationError| StoreError::invalid("status", e.to_string()))?;

    Ok(ValidatedFields {
        name: name.to_string(),
        email: email.to_string(),
        date_of_birth,
        class_label,
        status,
    })
}
