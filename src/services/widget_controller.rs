use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::anyhow;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::{
    insight::CompanyData,
    widget::{Effect, WidgetAction, WidgetState},
};

use super::{read_visibility, write_visibility, InsightSource, KeyValueStore};

/// What a classified company page contributes to a widget.
pub struct PageSnapshot {
    pub page_key: String,
    pub company: CompanyData,
    pub page_domain: Option<String>,
}

pub struct Transition {
    pub state: WidgetState,
    /// Insight fetch started by this transition, if any.
    pub pending: Option<JoinHandle<()>>,
}

/// Mounted widgets, evicted oldest first once `capacity` is reached.
struct Registry {
    by_id: HashMap<Uuid, WidgetState>,
    by_page: HashMap<String, Uuid>,
    order: VecDeque<Uuid>,
    capacity: usize,
}

impl Registry {
    fn with_capacity(capacity: usize) -> Self {
        Registry {
            by_id: HashMap::new(),
            by_page: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn find_page(&self, page_key: &str) -> Option<WidgetState> {
        self.by_page
            .get(page_key)
            .and_then(|id| self.by_id.get(id))
            .cloned()
    }

    fn insert(&mut self, state: WidgetState) {
        while self.order.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(evicted) = self.by_id.remove(&oldest) {
                self.by_page.remove(&evicted.page_key);
                log::info!("Evicted widget {} from {}", evicted.id, evicted.page_key);
            }
        }

        self.order.push_back(state.id);
        self.by_page.insert(state.page_key.clone(), state.id);
        self.by_id.insert(state.id, state);
    }
}

pub struct WidgetController<F: InsightSource> {
    store: Arc<dyn KeyValueStore>,
    source: F,
    widgets: Mutex<Registry>,
}

impl<F: InsightSource> WidgetController<F> {
    pub fn new(store: Arc<dyn KeyValueStore>, source: F, capacity: usize) -> Self {
        WidgetController {
            store,
            source,
            widgets: Mutex::new(Registry::with_capacity(capacity)),
        }
    }

    /// Mounts a widget on a page. A page that already carries one gets the
    /// existing widget back and nothing is started again.
    ///
    /// Reads the store, so call it off the async executor.
    pub fn mount(self: &Arc<Self>, snapshot: PageSnapshot) -> anyhow::Result<Transition> {
        let existing = self.lock()?.find_page(&snapshot.page_key);
        if let Some(existing) = existing {
            return Ok(already_mounted(existing));
        }

        let persisted_visible = read_visibility(self.store.as_ref());
        let (state, effects) = WidgetState::initialize(
            snapshot.page_key,
            &snapshot.company,
            snapshot.page_domain,
            persisted_visible,
        );

        {
            let mut widgets = self.lock()?;
            // Another mount for this page may have won while the store was read
            if let Some(existing) = widgets.find_page(&state.page_key) {
                return Ok(already_mounted(existing));
            }
            widgets.insert(state.clone());
        }
        log::info!("Mounted widget {} on {}", state.id, state.page_key);

        let pending = self.run_effects(state.id, effects);
        Ok(Transition { state, pending })
    }

    /// Applies an action to a mounted widget. `None` for an unknown or
    /// evicted id. Writes the store, so call it off the async executor.
    pub fn dispatch(
        self: &Arc<Self>,
        id: Uuid,
        action: WidgetAction,
    ) -> anyhow::Result<Option<Transition>> {
        let (state, effects) = {
            let mut widgets = self.lock()?;
            let Some(current) = widgets.by_id.remove(&id) else {
                return Ok(None);
            };
            let (next, effects) = current.apply(action);
            widgets.by_id.insert(id, next.clone());
            (next, effects)
        };

        let pending = self.run_effects(id, effects);
        Ok(Some(Transition { state, pending }))
    }

    pub fn get(&self, id: Uuid) -> anyhow::Result<Option<WidgetState>> {
        Ok(self.lock()?.by_id.get(&id).cloned())
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Registry>> {
        self.widgets
            .lock()
            .map_err(|_| anyhow!("Widget registry lock poisoned"))
    }

    fn run_effects(self: &Arc<Self>, id: Uuid, effects: Vec<Effect>) -> Option<JoinHandle<()>> {
        let mut pending = None;

        for effect in effects {
            match effect {
                Effect::PersistVisibility(visible) => {
                    write_visibility(self.store.as_ref(), visible)
                }
                Effect::FetchInsights {
                    company_name,
                    page_domain,
                } => pending = Some(self.spawn_fetch(id, company_name, page_domain)),
            }
        }

        pending
    }

    fn spawn_fetch(
        self: &Arc<Self>,
        id: Uuid,
        company_name: String,
        page_domain: Option<String>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);

        tokio::spawn(async move {
            let fetch_controller = Arc::clone(&controller);
            let fetch = tokio::spawn(async move {
                fetch_controller
                    .source
                    .fetch_insights(&company_name, page_domain.as_deref())
                    .await
            });

            let action = match fetch.await {
                Ok(Ok(insight)) => WidgetAction::InsightsLoaded(insight),
                Ok(Err(e)) => {
                    log::error!("Error fetching company insights: {:?}", e);
                    WidgetAction::FetchFailed
                }
                Err(e) => {
                    log::error!("Insight task for widget {} died: {:?}", id, e);
                    WidgetAction::FetchFailed
                }
            };

            if let Err(e) = controller.dispatch(id, action) {
                log::error!("Failed to update widget {}: {:?}", id, e);
            }
        })
    }
}

fn already_mounted(existing: WidgetState) -> Transition {
    log::info!(
        "Widget {} already mounted on {}",
        existing.id,
        existing.page_key
    );
    Transition {
        state: existing,
        pending: None,
    }
}
