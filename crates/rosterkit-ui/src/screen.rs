//! One roster screen session
//!
//! Wires a bus, a query cache, a form and a list together. Nothing here is
//! global: two screens built from the same store do not see each other's
//! messages.

use crate::form_controller::FormController;
use crate::list_controller::ListController;
use crate::query_cache::QueryCache;
use rosterkit_core::{FilterCriteria, MessageBus};
use rosterkit_store::RecordStore;
use std::sync::Arc;
use tokio::runtime::Handle;

pub struct RosterScreen {
    bus: Arc<MessageBus>,
    cache: Arc<QueryCache>,
    form: FormController,
    list: ListController,
}

impl RosterScreen {
    /// Mount a form and a list over `store`
    ///
    /// The list starts with `criteria` and issues the initial load.
    pub fn new(store: Arc<dyn RecordStore>, criteria: FilterCriteria, runtime: Handle) -> Self {
        let bus = Arc::new(MessageBus::new());
        let cache = QueryCache::new(store.clone(), runtime.clone());
        let form = FormController::mount(store, bus.clone(), runtime);
        let list = ListController::mount(bus.clone(), cache.clone(), criteria);
        tracing::info!("Roster screen mounted");

        Self {
            bus,
            cache,
            form,
            list,
        }
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn list(&self) -> &ListController {
        &self.list
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn bus(&self) -> &Arc<MessageBus> {
        &self.bus
    }

    /// Wait until background deletes and list calls have settled
    pub async fn settle(&self) {
        self.form.wait_idle().await;
        self.cache.wait_idle().await;
    }

    /// Unmount both controllers
    pub fn teardown(&self) {
        self.form.unmount();
        self.list.unmount();
        tracing::info!("Roster screen torn down");
    }
}

impl std::fmt::Debug for RosterScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterScreen")
            .field("bus", &self.bus)
            .field("cache", &self.cache)
            .field("form", &self.form)
            .field("list", &self.list)
            .finish()
    }
}
