//! Query cache for the student list
//!
//! Holds the last successful `list()` result and its status. Fetches run on
//! the tokio runtime; at most one list call is in flight at a time and
//! concurrent requests share its result. Subscribers are notified once per
//! settled fetch, on the task that ran it. On a multi-threaded runtime two
//! notifications may arrive out of order; compare `generation` to tell.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use rosterkit_core::{LoadError, RecordSet};
use rosterkit_store::RecordStore;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;

/// Outcome of one list call, shared by everyone waiting on it
pub type FetchResult = Result<Arc<RecordSet>, LoadError>;

/// A list call in flight; awaiting it yields its settled result
pub type Refresh = Shared<BoxFuture<'static, FetchResult>>;

type UpdateCallback = Arc<dyn Fn(&QuerySnapshot) + Send + Sync>;

/// Status of the cached query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// A list call is outstanding (or none has settled yet)
    Loading,
    /// The last list call succeeded
    Ready,
    /// The last list call failed
    Error,
}

/// What the cache currently holds
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub status: QueryStatus,
    /// Last successful record set. Stale while `Loading`, cleared on `Error`.
    pub records: Option<Arc<RecordSet>>,
    pub error: Option<LoadError>,
    /// Number of fetches settled when this snapshot was taken; a later
    /// snapshot never has a smaller one
    pub generation: u64,
}

impl QuerySnapshot {
    fn initial() -> Self {
        Self {
            status: QueryStatus::Loading,
            records: None,
            error: None,
            generation: 0,
        }
    }
}

/// Handle for removing an update subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpdateSubscription(u64);

struct CacheState {
    snapshot: QuerySnapshot,
    in_flight: Option<Refresh>,
    /// True once any fetch has been issued
    started: bool,
}

/// Reactive cache in front of `RecordStore::list`
///
/// The cached record set is written only here; everyone else reads
/// snapshots.
pub struct QueryCache {
    store: Arc<dyn RecordStore>,
    runtime: Handle,
    state: Mutex<CacheState>,
    subscribers: RwLock<Vec<(UpdateSubscription, UpdateCallback)>>,
    next_subscription: AtomicU64,
}

impl QueryCache {
    /// Create a cache over `store`, running fetches on `runtime`
    ///
    /// Nothing is fetched until the first `fetch`, `ensure_loaded` or
    /// `invalidate`.
    pub fn new(store: Arc<dyn RecordStore>, runtime: Handle) -> Arc<Self> {
        Arc::new(Self {
            store,
            runtime,
            state: Mutex::new(CacheState {
                snapshot: QuerySnapshot::initial(),
                in_flight: None,
                started: false,
            }),
            subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        })
    }

    /// Current snapshot
    pub fn snapshot(&self) -> QuerySnapshot {
        self.state.lock().snapshot.clone()
    }

    /// Check if a list call is outstanding
    pub fn is_fetching(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    /// Return the record set, fetching it if needed
    ///
    /// Joins the in-flight call if there is one. Otherwise returns the cached
    /// result when it is ready, or issues a new list call.
    pub async fn fetch(self: &Arc<Self>) -> FetchResult {
        let pending = {
            let state = self.state.lock();
            match (&state.in_flight, state.snapshot.status, &state.snapshot.records) {
                (Some(refresh), _, _) => Some(refresh.clone()),
                (None, QueryStatus::Ready, Some(records)) => return Ok(records.clone()),
                _ => None,
            }
        };

        match pending {
            Some(refresh) => refresh.await,
            None => self.invalidate().await,
        }
    }

    /// Start the initial load if nothing has been fetched yet
    pub fn ensure_loaded(self: &Arc<Self>) {
        let started = self.state.lock().started;
        if !started {
            let _ = self.invalidate();
        }
    }

    /// Mark the cached result stale and re-issue the list call
    ///
    /// Coalesces with a call already in flight. The returned future may be
    /// dropped; the call runs to completion and notifies subscribers either
    /// way.
    pub fn invalidate(self: &Arc<Self>) -> Refresh {
        let mut state = self.state.lock();
        if let Some(refresh) = &state.in_flight {
            tracing::debug!("List call already in flight, joining it");
            return refresh.clone();
        }

        state.started = true;
        state.snapshot.status = QueryStatus::Loading;

        let store = self.store.clone();
        let cache = Arc::downgrade(self);
        let refresh = async move {
            let result: FetchResult = store
                .list()
                .await
                .map(Arc::new)
                .map_err(LoadError::from);
            settle(&cache, &result);
            result
        }
        .boxed()
        .shared();

        state.in_flight = Some(refresh.clone());
        drop(state);

        tracing::debug!("Issuing list call");
        self.runtime.spawn(refresh.clone());
        refresh
    }

    /// Wait for the in-flight list call, if any, to settle
    pub async fn wait_idle(&self) {
        let pending = self.state.lock().in_flight.clone();
        if let Some(refresh) = pending {
            let _ = refresh.await;
        }
    }

    /// Register a callback run after every settled fetch
    pub fn subscribe<F>(&self, callback: F) -> UpdateSubscription
    where
        F: Fn(&QuerySnapshot) + Send + Sync + 'static,
    {
        let id = UpdateSubscription(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Arc::new(callback)));
        id
    }

    /// Remove an update subscription; false if it was already gone
    pub fn unsubscribe(&self, id: UpdateSubscription) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    /// Number of update subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    fn apply_result(&self, result: &FetchResult) -> QuerySnapshot {
        let mut state = self.state.lock();
        state.in_flight = None;
        let generation = state.snapshot.generation + 1;
        state.snapshot = match result {
            Ok(records) => {
                tracing::info!("Loaded {} students", records.len());
                QuerySnapshot {
                    status: QueryStatus::Ready,
                    records: Some(records.clone()),
                    error: None,
                    generation,
                }
            }
            Err(e) => {
                tracing::warn!("{}", e);
                QuerySnapshot {
                    status: QueryStatus::Error,
                    records: None,
                    error: Some(e.clone()),
                    generation,
                }
            }
        };
        state.snapshot.clone()
    }

    fn notify(&self, snapshot: &QuerySnapshot) {
        let subscribers: Vec<(UpdateSubscription, UpdateCallback)> = self.subscribers.read().clone();
        for (id, callback) in subscribers {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(snapshot))).is_err() {
                tracing::warn!("Cache subscriber {:?} panicked", id);
            }
        }
    }
}

fn settle(cache: &Weak<QueryCache>, result: &FetchResult) {
    if let Some(cache) = cache.upgrade() {
        let snapshot = cache.apply_result(result);
        cache.notify(&snapshot);
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("QueryCache")
            .field("status", &state.snapshot.status)
            .field(
                "records",
                &state.snapshot.records.as_ref().map(|r| r.len()),
            )
            .field("fetching", &state.in_flight.is_some())
            .field("generation", &state.snapshot.generation)
            .finish()
    }
}
