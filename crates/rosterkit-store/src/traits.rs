//! The record store interface

use async_trait::async_trait;
use rosterkit_core::{RecordSet, RemoteError, StudentFields, StudentId};

/// Result of a call across the record store boundary
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Authoritative source of student records
///
/// Implementations validate field values themselves; callers pass the raw
/// text entered in the form. Every failure is reported as a `RemoteError`
/// whose message can be shown to the user verbatim.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a record from field values
    async fn create(&self, fields: StudentFields) -> RemoteResult<()>;

    /// Replace the field values of an existing record
    async fn update(&self, id: &StudentId, fields: StudentFields) -> RemoteResult<()>;

    /// Delete a record
    async fn delete(&self, id: &StudentId) -> RemoteResult<()>;

    /// Fetch the full record set, in store order
    async fn list(&self) -> RemoteResult<RecordSet>;
}
