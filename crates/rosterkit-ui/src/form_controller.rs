//! Student form controller
//!
//! Owns the draft and the create/edit mode. Create, update and delete calls
//! go to the record store; each success resets the draft and publishes
//! `RosterEvent::Added` so the list refetches.
//!
//! State machine:
//! - `Create` --edited(record)--> `Edit`
//! - `Edit` --cancel / successful update / successful delete--> `Create`
//! - `Create` --successful create--> `Create` (draft cleared)

use parking_lot::Mutex;
use rosterkit_core::{
    ClassLabel, MessageBus, RemoteError, RosterError, RosterEvent, Status, Student,
    StudentFields, StudentId, SubscriptionId, ValidationError,
};
use rosterkit_store::RecordStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub const ADDED_MESSAGE: &str = "Student added successfully!";
pub const UPDATED_MESSAGE: &str = "Student updated successfully!";
pub const DELETED_MESSAGE: &str = "Student deleted successfully!";

/// Whether the form creates a new record or edits an existing one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Create,
    Edit {
        /// Record being edited
        id: StudentId,
    },
}

/// Which record a delete applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// A record picked from the list
    Record(StudentId),
    /// The record currently loaded in the form
    CurrentDraft,
}

/// A label/value pair for a picklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    fn same(text: String) -> Self {
        Self {
            label: text.clone(),
            value: text,
        }
    }
}

/// Everything the form renders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub mode: FormMode,
    pub draft: StudentFields,
    /// A remote call is in flight
    pub loading: bool,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

impl FormState {
    fn reset(&mut self) {
        self.mode = FormMode::Create;
        self.draft = StudentFields::default();
    }
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Create,
    Update,
    Delete,
}

impl Mutation {
    fn success_message(self) -> &'static str {
        match self {
            Mutation::Create => ADDED_MESSAGE,
            Mutation::Update => UPDATED_MESSAGE,
            Mutation::Delete => DELETED_MESSAGE,
        }
    }
}

struct FormInner {
    store: Arc<dyn RecordStore>,
    bus: Arc<MessageBus>,
    runtime: Handle,
    state: Mutex<FormState>,
    mounted: AtomicBool,
    subscription: Mutex<Option<SubscriptionId>>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

/// The add/edit/delete form of one roster screen
pub struct FormController {
    inner: Arc<FormInner>,
}

impl FormController {
    /// Create the form and subscribe it to the bus
    ///
    /// `edited` loads the record into the draft; `deleteRequested` starts a
    /// delete on `runtime`.
    pub fn mount(store: Arc<dyn RecordStore>, bus: Arc<MessageBus>, runtime: Handle) -> Self {
        let inner = Arc::new(FormInner {
            store,
            bus: bus.clone(),
            runtime,
            state: Mutex::new(FormState::default()),
            mounted: AtomicBool::new(true),
            subscription: Mutex::new(None),
            background: Mutex::new(Vec::new()),
        });

        let weak: Weak<FormInner> = Arc::downgrade(&inner);
        let id = bus.subscribe(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_event(event);
            }
        });
        *inner.subscription.lock() = Some(id);
        tracing::debug!("Form mounted ({})", id);

        Self { inner }
    }

    /// Stop listening to the bus; results that arrive later are ignored
    ///
    /// Safe to call more than once.
    pub fn unmount(&self) {
        self.inner.mounted.store(false, Ordering::SeqCst);
        if let Some(id) = self.inner.subscription.lock().take() {
            self.inner.bus.unsubscribe(id);
            tracing::debug!("Form unmounted ({})", id);
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.is_mounted()
    }

    /// Copy of the current form state
    pub fn state(&self) -> FormState {
        self.inner.state.lock().clone()
    }

    pub fn mode(&self) -> FormMode {
        self.inner.state.lock().mode.clone()
    }

    pub fn draft(&self) -> StudentFields {
        self.inner.state.lock().draft.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().loading
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.inner.state.lock().mode, FormMode::Edit { .. })
    }

    /// Identifier of the record being edited
    pub fn editing_id(&self) -> Option<StudentId> {
        match &self.inner.state.lock().mode {
            FormMode::Edit { id } => Some(id.clone()),
            FormMode::Create => None,
        }
    }

    pub fn success_message(&self) -> Option<String> {
        self.inner.state.lock().success_message.clone()
    }

    pub fn error_message(&self) -> Option<String> {
        self.inner.state.lock().error_message.clone()
    }

    /// Label of the submit action
    pub fn submit_label(&self) -> &'static str {
        if self.is_editing() {
            "Update Student"
        } else {
            "Add Student"
        }
    }

    /// Cancel is only offered while editing
    pub fn can_cancel(&self) -> bool {
        self.is_editing()
    }

    /// The nine class labels, grade-major
    pub fn class_options() -> Vec<SelectOption> {
        ClassLabel::all()
            .into_iter()
            .map(|label| SelectOption::same(label.to_string()))
            .collect()
    }

    /// Active, Inactive
    pub fn status_options() -> Vec<SelectOption> {
        Status::all()
            .into_iter()
            .map(|status| SelectOption::same(status.to_string()))
            .collect()
    }

    pub fn set_name(&self, value: impl Into<String>) {
        self.inner.state.lock().draft.name = value.into();
    }

    pub fn set_email(&self, value: impl Into<String>) {
        self.inner.state.lock().draft.email = value.into();
    }

    pub fn set_date_of_birth(&self, value: impl Into<String>) {
        self.inner.state.lock().draft.date_of_birth = value.into();
    }

    pub fn set_class_name(&self, value: impl Into<String>) {
        self.inner.state.lock().draft.class_name = value.into();
    }

    pub fn set_status(&self, value: impl Into<String>) {
        self.inner.state.lock().draft.status = value.into();
    }

    /// Load a record into the draft and switch to `Edit`
    pub fn begin_edit(&self, record: &Student) -> Result<(), RosterError> {
        self.inner.begin_edit(record)
    }

    /// Discard the draft and return to `Create`; no remote call
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        state.reset();
        state.success_message = None;
        state.error_message = None;
        tracing::debug!("Form cancelled");
    }

    /// Create in `Create` mode, update in `Edit` mode
    pub async fn submit(&self) -> Result<(), RosterError> {
        if self.is_editing() {
            self.submit_update().await
        } else {
            self.submit_create().await
        }
    }

    /// Create a record from the draft
    pub async fn submit_create(&self) -> Result<(), RosterError> {
        self.inner.submit_create().await
    }

    /// Update the record being edited with the draft
    pub async fn submit_update(&self) -> Result<(), RosterError> {
        self.inner.submit_update().await
    }

    /// Delete a record
    pub async fn request_delete(&self, target: DeleteTarget) -> Result<(), RosterError> {
        self.inner.request_delete(target).await
    }

    /// Wait for deletes started from the bus to finish
    pub async fn wait_idle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = self.inner.background.lock().drain(..).collect();
            if pending.is_empty() {
                break;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    tracing::error!("Background delete failed: {}", e);
                }
            }
        }
    }
}

impl Drop for FormController {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for FormController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormController")
            .field("state", &*self.inner.state.lock())
            .field("mounted", &self.inner.is_mounted())
            .finish()
    }
}

impl FormInner {
    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    fn handle_event(self: &Arc<Self>, event: RosterEvent) {
        if !self.is_mounted() {
            return;
        }
        match event {
            RosterEvent::Added => {}
            RosterEvent::Edited(record) => {
                if let Err(e) = self.begin_edit(&record) {
                    tracing::warn!("Ignoring edit of {}: {}", record.id, e);
                }
            }
            RosterEvent::DeleteRequested(record) => {
                let inner = self.clone();
                let handle = self.runtime.spawn(async move {
                    if let Err(e) = inner.request_delete(DeleteTarget::Record(record.id)).await {
                        tracing::warn!("Delete from list did not complete: {}", e);
                    }
                });
                let mut background = self.background.lock();
                background.retain(|h| !h.is_finished());
                background.push(handle);
            }
        }
    }

    fn begin_edit(&self, record: &Student) -> Result<(), RosterError> {
        let mut state = self.state.lock();
        if state.loading {
            state.error_message = Some(ValidationError::Busy.to_string());
            return Err(ValidationError::Busy.into());
        }
        state.draft = record.fields();
        state.mode = FormMode::Edit {
            id: record.id.clone(),
        };
        state.success_message = None;
        state.error_message = None;
        tracing::debug!("Editing {} ({})", record.name, record.id);
        Ok(())
    }

    /// Check preconditions and mark the form busy
    ///
    /// On success the caller holds the in-flight slot until it passes the
    /// guard to `finish` or drops it.
    fn begin<T>(
        &self,
        check: impl FnOnce(&FormState) -> Result<T, ValidationError>,
    ) -> Result<(T, InFlight<'_>), RosterError> {
        if !self.is_mounted() {
            return Err(RosterError::Unmounted);
        }
        let mut state = self.state.lock();
        if state.loading {
            state.error_message = Some(ValidationError::Busy.to_string());
            return Err(ValidationError::Busy.into());
        }
        match check(&state) {
            Ok(value) => {
                state.loading = true;
                state.success_message = None;
                state.error_message = None;
                Ok((
                    value,
                    InFlight {
                        state: &self.state,
                        armed: true,
                    },
                ))
            }
            Err(e) => {
                state.success_message = None;
                state.error_message = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Apply the result of a remote call, then publish on success
    fn finish(
        &self,
        in_flight: InFlight<'_>,
        mutation: Mutation,
        result: Result<(), RemoteError>,
    ) -> Result<(), RosterError> {
        if !self.is_mounted() {
            tracing::debug!("Form torn down, dropping {:?} result", mutation);
            return Err(RosterError::Unmounted);
        }
        in_flight.disarm();

        {
            let mut state = self.state.lock();
            state.loading = false;
            match &result {
                Ok(()) => {
                    state.reset();
                    state.success_message = Some(mutation.success_message().to_string());
                    state.error_message = None;
                }
                Err(e) => {
                    state.error_message = Some(e.message.clone());
                }
            }
        }

        match result {
            Ok(()) => {
                tracing::info!("{}", mutation.success_message());
                self.bus.publish(RosterEvent::Added);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("{:?} rejected: {}", mutation, e);
                Err(e.into())
            }
        }
    }

    async fn submit_create(&self) -> Result<(), RosterError> {
        let (fields, in_flight) = self.begin(|state| {
            required_fields(&state.draft)?;
            Ok(state.draft.clone())
        })?;
        let result = self.store.create(fields).await;
        self.finish(in_flight, Mutation::Create, result)
    }

    async fn submit_update(&self) -> Result<(), RosterError> {
        let ((id, fields), in_flight) = self.begin(|state| {
            let id = match &state.mode {
                FormMode::Edit { id } if !id.is_empty() => id.clone(),
                _ => {
                    return Err(ValidationError::MissingIdentifier {
                        operation: "update",
                    })
                }
            };
            required_fields(&state.draft)?;
            Ok((id, state.draft.clone()))
        })?;
        let result = self.store.update(&id, fields).await;
        self.finish(in_flight, Mutation::Update, result)
    }

    async fn request_delete(&self, target: DeleteTarget) -> Result<(), RosterError> {
        let (id, in_flight) = self.begin(|state| {
            let id = match (&target, &state.mode) {
                (DeleteTarget::Record(id), _) => Some(id.clone()),
                (DeleteTarget::CurrentDraft, FormMode::Edit { id }) => Some(id.clone()),
                (DeleteTarget::CurrentDraft, FormMode::Create) => None,
            };
            id.filter(|id| !id.is_empty())
                .ok_or(ValidationError::MissingIdentifier {
                    operation: "delete",
                })
        })?;
        let result = self.store.delete(&id).await;
        self.finish(in_flight, Mutation::Delete, result)
    }
}

/// Marks a remote call as in flight; clears `loading` if the call is
/// abandoned before `finish` sees its result
struct InFlight<'a> {
    state: &'a Mutex<FormState>,
    armed: bool,
}

impl InFlight<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().loading = false;
            tracing::debug!("Form call abandoned before completion");
        }
    }
}

fn required_fields(draft: &StudentFields) -> Result<(), ValidationError> {
    match draft.first_missing() {
        Some(field) => Err(ValidationError::MissingField { field }),
        None => Ok(()),
    }
}
