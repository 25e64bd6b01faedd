//! In-memory record store

use crate::error::{StoreError, StoreResult};
use crate::traits::{RecordStore, RemoteResult};
use crate::validation::validate_fields;
use async_trait::async_trait;
use chrono::NaiveDate;
use rosterkit_core::{ClassLabel, RecordSet, Status, Student, StudentFields, StudentId};
use tokio::sync::RwLock;

/// Record store kept in process memory
///
/// Records are listed in insertion order. Identifiers are UUID v4 strings.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Student>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding these records
    pub fn with_records(records: RecordSet) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Create a store seeded with `demo_records()`
    pub fn with_demo_data() -> Self {
        Self::with_records(demo_records())
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Check if the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Copy of every record
    pub async fn snapshot(&self) -> RecordSet {
        self.records.read().await.clone()
    }

    /// Replace every record at once
    pub(crate) async fn commit(&self, records: RecordSet) {
        *self.records.write().await = records;
    }

    pub(crate) async fn insert(&self, fields: &StudentFields) -> StoreResult<Student> {
        insert_into(&mut *self.records.write().await, fields)
    }

    pub(crate) async fn replace(&self, id: &StudentId, fields: &StudentFields) -> StoreResult<Student> {
        replace_in(&mut *self.records.write().await, id, fields)
    }

    pub(crate) async fn remove(&self, id: &StudentId) -> StoreResult<Student> {
        remove_from(&mut *self.records.write().await, id)
    }
}

/// Validate `fields` and append a new record
pub(crate) fn insert_into(records: &mut RecordSet, fields: &StudentFields) -> StoreResult<Student> {
    let student = validate_fields(fields)?.into_student(StudentId::generate());
    records.push(student.clone());
    Ok(student)
}

/// Validate `fields` and overwrite the record with `id` in place
pub(crate) fn replace_in(
    records: &mut RecordSet,
    id: &StudentId,
    fields: &StudentFields,
) -> StoreResult<Student> {
    let valid = validate_fields(fields)?;
    let slot = records
        .iter_mut()
        .find(|s| &s.id == id)
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;
    *slot = valid.into_student(id.clone());
    Ok(slot.clone())
}

pub(crate) fn remove_from(records: &mut RecordSet, id: &StudentId) -> StoreResult<Student> {
    let index = records
        .iter()
        .position(|s| &s.id == id)
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;
    Ok(records.remove(index))
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, fields: StudentFields) -> RemoteResult<()> {
        let student = self.insert(&fields).await?;
        tracing::info!("Created student {} ({})", student.name, student.id);
        Ok(())
    }

    async fn update(&self, id: &StudentId, fields: StudentFields) -> RemoteResult<()> {
        self.replace(id, &fields).await?;
        tracing::info!("Updated student {}", id);
        Ok(())
    }

    async fn delete(&self, id: &StudentId) -> RemoteResult<()> {
        let removed = self.remove(id).await?;
        tracing::info!("Deleted student {} ({})", removed.name, id);
        Ok(())
    }

    async fn list(&self) -> RemoteResult<RecordSet> {
        Ok(self.snapshot().await)
    }
}

/// A small sample roster for trying the screen out
pub fn demo_records() -> RecordSet {
    let rows = [
        ("An Nguyen", "an.nguyen@school.edu", (2008, 3, 14), (10, 1), Status::Active),
        ("Binh Tran", "binh.tran@school.edu", (2007, 11, 2), (11, 2), Status::Inactive),
        ("Chi Le", "chi.le@school.edu", (2006, 6, 21), (12, 1), Status::Active),
        ("Dung Pham", "dung.pham@school.edu", (2008, 9, 5), (10, 3), Status::Active),
        ("Giang Vo", "giang.vo@school.edu", (2007, 1, 30), (11, 1), Status::Active),
    ];

    rows.into_iter()
        .filter_map(|(name, email, (y, m, d), (grade, section), status)| {
            Some(Student {
                id: StudentId::generate(),
                name: name.to_string(),
                email: email.to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(y, m, d)?,
                class_label: ClassLabel::new(grade, section)?,
                status,
            })
        })
        .collect()
}
