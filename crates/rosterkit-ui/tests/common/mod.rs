//! Record store doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use rosterkit_core::{
    MessageBus, RecordSet, RemoteError, RosterEvent, Status, Student, StudentFields, StudentId,
};
use rosterkit_store::{MemoryStore, RecordStore, RemoteResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Memory store that counts calls, can be told to fail, and can hold calls
/// until released
#[derive(Default)]
pub struct TestStore {
    inner: MemoryStore,
    creates: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
    lists: AtomicUsize,
    list_failure: Mutex<Option<String>>,
    mutation_failure: Mutex<Option<String>>,
    list_gate: Mutex<Option<Arc<Semaphore>>>,
    mutation_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl TestStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_records(records: RecordSet) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::with_records(records),
            ..Self::default()
        })
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        self.creates() + self.updates() + self.deletes()
    }

    pub async fn records(&self) -> RecordSet {
        self.inner.snapshot().await
    }

    pub fn fail_lists(&self, message: &str) {
        *self.list_failure.lock() = Some(message.to_string());
    }

    pub fn fail_mutations(&self, message: &str) {
        *self.mutation_failure.lock() = Some(message.to_string());
    }

    pub fn clear_failures(&self) {
        *self.list_failure.lock() = None;
        *self.mutation_failure.lock() = None;
    }

    /// Make list calls wait until `release_lists`
    pub fn hold_lists(&self) {
        *self.list_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_lists(&self) {
        if let Some(gate) = self.list_gate.lock().take() {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    /// Make create/update/delete wait until `release_mutations`
    pub fn hold_mutations(&self) {
        *self.mutation_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_mutations(&self) {
        if let Some(gate) = self.mutation_gate.lock().take() {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    async fn pass(gate: &Mutex<Option<Arc<Semaphore>>>) {
        let gate = gate.lock().clone();
        if let Some(gate) = gate {
            let _ = gate.acquire().await;
        }
    }

    fn scripted(failure: &Mutex<Option<String>>) -> RemoteResult<()> {
        match failure.lock().clone() {
            Some(message) => Err(RemoteError::new(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for TestStore {
    async fn create(&self, fields: StudentFields) -> RemoteResult<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Self::pass(&self.mutation_gate).await;
        Self::scripted(&self.mutation_failure)?;
        self.inner.create(fields).await
    }

    async fn update(&self, id: &StudentId, fields: StudentFields) -> RemoteResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Self::pass(&self.mutation_gate).await;
        Self::scripted(&self.mutation_failure)?;
        self.inner.update(id, fields).await
    }

    async fn delete(&self, id: &StudentId) -> RemoteResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Self::pass(&self.mutation_gate).await;
        Self::scripted(&self.mutation_failure)?;
        self.inner.delete(id).await
    }

    async fn list(&self) -> RemoteResult<RecordSet> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Self::pass(&self.list_gate).await;
        Self::scripted(&self.list_failure)?;
        self.inner.list().await
    }
}

/// Records every message published on a bus
pub struct EventLog {
    events: Arc<Mutex<Vec<RosterEvent>>>,
}

impl EventLog {
    pub fn attach(bus: &MessageBus) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        bus.subscribe(move |event| sink.lock().push(event));
        Self { events }
    }

    pub fn events(&self) -> Vec<RosterEvent> {
        self.events.lock().clone()
    }

    pub fn added_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, RosterEvent::Added))
            .count()
    }
}

pub fn student(id: &str, name: &str, class: &str, status: Status) -> Student {
    Student {
        id: StudentId::from(id),
        name: name.to_string(),
        email: format!("{}@school.edu", name.to_lowercase()),
        date_of_birth: NaiveDate::from_ymd_opt(2008, 4, 12).unwrap(),
        class_label: class.parse().unwrap(),
        status,
    }
}

/// `An` (10A1, Active) and `Binh` (11A2, Inactive)
pub fn an_and_binh() -> RecordSet {
    vec![
        student("1", "An", "10A1", Status::Active),
        student("2", "Binh", "11A2", Status::Inactive),
    ]
}

pub fn valid_fields(name: &str) -> StudentFields {
    StudentFields {
        name: name.to_string(),
        email: format!("{}@school.edu", name.to_lowercase()),
        date_of_birth: "2008-09-01".to_string(),
        class_name: "12A2".to_string(),
        status: "Active".to_string(),
    }
}
