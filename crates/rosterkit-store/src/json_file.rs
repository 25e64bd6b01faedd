//! Record store persisted to a JSON file
//!
//! The whole record set is kept in memory and rewritten as pretty-printed
//! JSON after every successful mutation.

use crate::error::StoreResult;
use crate::memory::{insert_into, remove_from, replace_in, MemoryStore};
use crate::traits::{RecordStore, RemoteResult};
use async_trait::async_trait;
use rosterkit_core::{RecordSet, StudentFields, StudentId};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// File-backed record store
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: MemoryStore,
    /// Serializes stage-write-commit so the file and memory agree
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store at `path`
    ///
    /// A missing file is an empty store; it is created on the first mutation.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let records: RecordSet = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Opened {} with {} students", path.display(), records.len());
        Ok(Self {
            path,
            records: MemoryStore::with_records(records),
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed an empty store and write it out
    pub async fn seed_if_empty(&self, records: RecordSet) -> StoreResult<bool> {
        if !self.records.is_empty().await {
            return Ok(false);
        }
        self.stage(|next| {
            if !next.is_empty() {
                return Ok(false);
            }
            for student in &records {
                insert_into(next, &student.fields())?;
            }
            Ok(true)
        })
        .await
    }

    /// Apply `change` to a copy of the records, write the copy, then keep it
    ///
    /// Memory only moves forward once the file holds the new state.
    async fn stage<T>(
        &self,
        change: impl FnOnce(&mut RecordSet) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.records.snapshot().await;
        let outcome = change(&mut next)?;
        self.persist(&next).await?;
        self.records.commit(next).await;
        Ok(outcome)
    }

    async fn persist(&self, records: &RecordSet) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(records)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, content).await?;
        tracing::debug!("Wrote {} students to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn create(&self, fields: StudentFields) -> RemoteResult<()> {
        let student = self.stage(|next| insert_into(next, &fields)).await?;
        tracing::info!("Created student {} ({})", student.name, student.id);
        Ok(())
    }

    async fn update(&self, id: &StudentId, fields: StudentFields) -> RemoteResult<()> {
        self.stage(|next| replace_in(next, id, &fields)).await?;
        tracing::info!("Updated student {}", id);
        Ok(())
    }

    async fn delete(&self, id: &StudentId) -> RemoteResult<()> {
        let removed = self.stage(|next| remove_from(next, id)).await?;
        tracing::info!("Deleted student {} ({})", removed.name, id);
        Ok(())
    }

    async fn list(&self) -> RemoteResult<RecordSet> {
        Ok(self.records.snapshot().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::demo_records;
    use tempfile::TempDir;

    fn fields(name: &str) -> StudentFields {
        StudentFields {
            name: name.to_string(),
            email: "someone@school.edu".to_string(),
            date_of_birth: "2007-04-01".to_string(),
            class_name: "11A3".to_string(),
            status: "Inactive".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("students.json"))
            .await
            .unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_mutations_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("students.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        store.create(fields("An")).await.unwrap();
        store.create(fields("Binh")).await.unwrap();
        let an = store.list().await.unwrap()[0].id.clone();
        store.delete(&an).await.unwrap();

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let records = reopened.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Binh");
        assert_eq!(records[0].class_label.to_string(), "11A3");
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.json");
        let store = JsonFileStore::open(&path).await.unwrap();

        let err = store
            .create(StudentFields {
                email: "broken".to_string(),
                ..fields("An")
            })
            .await
            .unwrap_err();
        assert!(err.message.starts_with("Invalid email"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("blocker").join("students.json"))
            .await
            .unwrap();
        // A plain file where the parent directory should be
        std::fs::write(dir.path().join("blocker"), "").unwrap();

        assert!(store.create(fields("An")).await.is_err());
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.seed_if_empty(demo_records()).await.is_err());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_existing_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("students.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        store.create(fields("An")).await.unwrap();
        let an = store.list().await.unwrap()[0].clone();

        std::fs::remove_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data"), "").unwrap();

        assert!(store.update(&an.id, fields("An Nguyen")).await.is_err());
        assert!(store.delete(&an.id).await.is_err());
        assert_eq!(store.list().await.unwrap(), vec![an]);
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(JsonFileStore::open(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("students.json"))
            .await
            .unwrap();

        assert!(store.seed_if_empty(demo_records()).await.unwrap());
        assert!(!store.seed_if_empty(demo_records()).await.unwrap());
        assert_eq!(store.list().await.unwrap().len(), demo_records().len());
    }
}
