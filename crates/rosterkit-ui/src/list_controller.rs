//! Student list controller
//!
//! Observes the query cache and the message bus, keeps the filter criteria,
//! and re-derives the visible rows on every cache update and every criteria
//! change. Row actions never call the store; they are published on the bus
//! for the form to handle.

use crate::query_cache::{QueryCache, QuerySnapshot, QueryStatus, UpdateSubscription};
use crate::report::ExportRequest;
use parking_lot::Mutex;
use rosterkit_core::{
    apply_filter, ClassFilter, FilterCriteria, LoadError, MessageBus, RecordSet, RosterError,
    RosterEvent, StatusFilter, Student, StudentId, SubscriptionId, ValidationError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

type RowsCallback = Arc<dyn Fn(&[Student]) + Send + Sync>;

/// How a grid column renders its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Email,
    Date,
}

/// A data grid column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub label: &'static str,
    pub field: &'static str,
    pub kind: ColumnKind,
}

pub const COLUMNS: [ColumnDef; 5] = [
    ColumnDef {
        label: "Name",
        field: "name",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        label: "Email",
        field: "email",
        kind: ColumnKind::Email,
    },
    ColumnDef {
        label: "Date of Birth",
        field: "date_of_birth",
        kind: ColumnKind::Date,
    },
    ColumnDef {
        label: "Class",
        field: "class_label",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        label: "Status",
        field: "status",
        kind: ColumnKind::Text,
    },
];

/// Per-row action offered by the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
}

struct ListState {
    criteria: FilterCriteria,
    records: Option<Arc<RecordSet>>,
    status: QueryStatus,
    error: Option<LoadError>,
    /// Set by the first settled fetch
    settled: bool,
    /// Generation of the last applied cache snapshot
    generation: u64,
    visible: Vec<Student>,
}

impl ListState {
    fn rederive(&mut self) {
        self.visible = match &self.records {
            Some(records) => apply_filter(records, &self.criteria),
            None => Vec::new(),
        };
    }
}

struct ListInner {
    bus: Arc<MessageBus>,
    cache: Arc<QueryCache>,
    state: Mutex<ListState>,
    mounted: AtomicBool,
    bus_subscription: Mutex<Option<SubscriptionId>>,
    cache_subscription: Mutex<Option<UpdateSubscription>>,
    row_listeners: Mutex<Vec<RowsCallback>>,
}

/// The searchable student grid of one roster screen
pub struct ListController {
    inner: Arc<ListInner>,
}

impl ListController {
    /// Subscribe to the bus and the cache and start the initial load
    pub fn mount(bus: Arc<MessageBus>, cache: Arc<QueryCache>, criteria: FilterCriteria) -> Self {
        let inner = Arc::new(ListInner {
            bus: bus.clone(),
            cache: cache.clone(),
            state: Mutex::new(ListState {
                criteria,
                records: None,
                status: QueryStatus::Loading,
                error: None,
                settled: false,
                generation: 0,
                visible: Vec::new(),
            }),
            mounted: AtomicBool::new(true),
            bus_subscription: Mutex::new(None),
            cache_subscription: Mutex::new(None),
            row_listeners: Mutex::new(Vec::new()),
        });

        let weak: Weak<ListInner> = Arc::downgrade(&inner);
        let bus_id = bus.subscribe(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_event(event);
            }
        });
        *inner.bus_subscription.lock() = Some(bus_id);

        let weak: Weak<ListInner> = Arc::downgrade(&inner);
        let cache_id = cache.subscribe(move |snapshot| {
            if let Some(inner) = weak.upgrade() {
                inner.apply_snapshot(snapshot);
            }
        });
        *inner.cache_subscription.lock() = Some(cache_id);

        cache.ensure_loaded();
        let snapshot = cache.snapshot();
        if snapshot.status != QueryStatus::Loading {
            inner.apply_snapshot(&snapshot);
        }

        tracing::debug!("List mounted ({})", bus_id);
        Self { inner }
    }

    /// Release the bus and cache subscriptions
    ///
    /// Safe to call more than once.
    pub fn unmount(&self) {
        self.inner.mounted.store(false, Ordering::SeqCst);
        if let Some(id) = self.inner.bus_subscription.lock().take() {
            self.inner.bus.unsubscribe(id);
            tracing::debug!("List unmounted ({})", id);
        }
        if let Some(id) = self.inner.cache_subscription.lock().take() {
            self.inner.cache.unsubscribe(id);
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    /// Grid column definitions
    pub fn columns(&self) -> &'static [ColumnDef] {
        &COLUMNS
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.inner.state.lock().criteria.clone()
    }

    /// Rows currently shown, in store order
    pub fn visible_rows(&self) -> Vec<Student> {
        self.inner.state.lock().visible.clone()
    }

    /// Size of the unfiltered record set
    pub fn record_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .records
            .as_ref()
            .map_or(0, |r| r.len())
    }

    pub fn status(&self) -> QueryStatus {
        self.inner.state.lock().status
    }

    /// True from mount until the first fetch settles
    pub fn is_loading(&self) -> bool {
        !self.inner.state.lock().settled
    }

    pub fn has_students(&self) -> bool {
        !self.inner.state.lock().visible.is_empty()
    }

    pub fn error_message(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .error
            .as_ref()
            .map(|e| e.to_string())
    }

    pub fn set_search_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.inner.update_criteria(|c| c.search_text = text);
    }

    pub fn set_class_filter(&self, filter: ClassFilter) {
        self.inner.update_criteria(|c| c.class_filter = filter);
    }

    pub fn set_status_filter(&self, filter: StatusFilter) {
        self.inner.update_criteria(|c| c.status_filter = filter);
    }

    pub fn set_criteria(&self, criteria: FilterCriteria) {
        self.inner.update_criteria(|c| *c = criteria);
    }

    /// Run `callback` with the rows after every re-derivation
    pub fn on_rows_changed<F>(&self, callback: F)
    where
        F: Fn(&[Student]) + Send + Sync + 'static,
    {
        self.inner.row_listeners.lock().push(Arc::new(callback));
    }

    /// Publish `edited` or `deleteRequested` for a visible row
    pub fn handle_row_action(&self, action: RowAction, id: &StudentId) -> Result<(), RosterError> {
        let record = self
            .inner
            .state
            .lock()
            .visible
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownRecord(id.clone()))?;

        let event = match action {
            RowAction::Edit => RosterEvent::Edited(record),
            RowAction::Delete => RosterEvent::DeleteRequested(record),
        };
        self.inner.bus.publish(event);
        Ok(())
    }

    /// Snapshot of the visible rows and criteria for a report
    pub fn export_request(&self) -> ExportRequest {
        let state = self.inner.state.lock();
        ExportRequest::new(state.visible.clone(), state.criteria.clone())
    }
}

impl Drop for ListController {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for ListController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ListController")
            .field("criteria", &state.criteria)
            .field("status", &state.status)
            .field("visible", &state.visible.len())
            .finish()
    }
}

impl ListInner {
    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    fn handle_event(&self, event: RosterEvent) {
        if !self.is_mounted() {
            return;
        }
        match event {
            RosterEvent::Added => {
                tracing::debug!("Data changed, refreshing list");
                let _ = self.cache.invalidate();
            }
            // Published by this controller, consumed by the form
            RosterEvent::Edited(_) | RosterEvent::DeleteRequested(_) => {}
        }
    }

    fn apply_snapshot(&self, snapshot: &QuerySnapshot) {
        if !self.is_mounted() {
            return;
        }
        let rows = {
            let mut state = self.state.lock();
            if snapshot.generation < state.generation {
                tracing::debug!(
                    "Skipping stale snapshot {} (have {})",
                    snapshot.generation,
                    state.generation
                );
                return;
            }
            state.generation = snapshot.generation;
            state.status = snapshot.status;
            match snapshot.status {
                QueryStatus::Loading => {}
                QueryStatus::Ready => {
                    state.records = snapshot.records.clone();
                    state.error = None;
                    state.settled = true;
                }
                QueryStatus::Error => {
                    state.records = None;
                    state.error = snapshot.error.clone();
                    state.settled = true;
                }
            }
            state.rederive();
            state.visible.clone()
        };
        self.emit_rows(&rows);
    }

    fn update_criteria(&self, change: impl FnOnce(&mut FilterCriteria)) {
        let rows = {
            let mut state = self.state.lock();
            change(&mut state.criteria);
            state.rederive();
            state.visible.clone()
        };
        self.emit_rows(&rows);
    }

    fn emit_rows(&self, rows: &[Student]) {
        let listeners: Vec<RowsCallback> = self.row_listeners.lock().clone();
        for listener in listeners {
            listener(rows);
        }
    }
}
