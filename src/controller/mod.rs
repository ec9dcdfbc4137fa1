//! Inspector controller.
//!
//! The controller owns the filter and page cursor for the traffic list, runs
//! queries against the transaction store, and publishes [`InspectorState`]
//! through a `tokio::sync::watch` channel.
//!
//! # Generations
//!
//! Every operation that starts a new query takes a generation stamp under the
//! view lock. A result is only published if its stamp is still current when it
//! comes back, so a superseded reload, search or "load more" can never
//! overwrite newer state. Search input has its own stamp: only the most recent
//! `set_search` call may apply its term.

pub mod debounce;
pub mod state;

pub use debounce::Debouncer;
pub use state::{InspectorError, InspectorState, Phase};

use crate::config::InspectorConfig;
use crate::models::Transaction;
use crate::pagination::{PageState, Paginator};
use crate::query::{Filter, QueryEngine, TransactionStats};
use crate::store::TransactionStore;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Presentation-facing orchestrator for the traffic list.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct InspectorController {
    inner: Arc<Shared>,
}

struct Shared {
    store: Arc<dyn TransactionStore>,
    engine: Arc<QueryEngine>,
    debounce: Duration,
    view: Mutex<View>,
    state_tx: watch::Sender<InspectorState>,
    search: Debouncer,
}

/// Mutable controller state. Guarded by `Shared::view`, never held across `.await`.
struct View {
    phase: Phase,
    filter: Filter,
    page: PageState,
    /// Full filtered result of the last successful query.
    results: Vec<Arc<Transaction>>,
    /// Rows revealed so far.
    displayed: Vec<Arc<Transaction>>,
    error: Option<Arc<InspectorError>>,
    generation: u64,
    search_generation: u64,
}

impl InspectorController {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        engine: Arc<QueryEngine>,
        config: &InspectorConfig,
    ) -> Self {
        let page = PageState::new(config.items_per_page);
        let (state_tx, _) = watch::channel(InspectorState {
            page,
            ..InspectorState::default()
        });

        Self {
            inner: Arc::new(Shared {
                store,
                engine,
                debounce: config.search_debounce(),
                view: Mutex::new(View {
                    phase: Phase::Idle,
                    filter: Filter::default(),
                    page,
                    results: Vec::new(),
                    displayed: Vec::new(),
                    error: None,
                    generation: 0,
                    search_generation: 0,
                }),
                state_tx,
                search: Debouncer::new(),
            }),
        }
    }

    /// Receiver that observes every published state, in order.
    pub fn subscribe(&self) -> watch::Receiver<InspectorState> {
        self.inner.state_tx.subscribe()
    }

    /// Latest published state.
    pub fn state(&self) -> InspectorState {
        self.inner.state_tx.borrow().clone()
    }

    /// Filter currently applied (including any search term already in effect).
    pub fn filter(&self) -> Filter {
        self.lock_view().filter.clone()
    }

    /// Snapshots the store, applies the current filter and shows page 0.
    pub async fn reload(&self) {
        let (ticket, filter) = {
            let mut view = self.lock_view();
            let ticket = view.begin();
            view.phase = Phase::Loading;
            self.publish(&view);
            (ticket, view.filter.clone())
        };

        let result = self.run_query(filter).await;
        self.apply(ticket, result);
    }

    /// Re-runs the last query after an error.
    pub async fn retry(&self) {
        self.reload().await;
    }

    /// Replaces the whole filter and reloads from page 0.
    ///
    /// Cancels any pending debounced search.
    pub async fn set_filter(&self, filter: Filter) {
        self.inner.search.cancel();
        {
            let mut view = self.lock_view();
            view.search_generation += 1;
            view.filter = filter;
        }
        self.reload().await;
    }

    /// Changes the page size and reloads from page 0.
    pub async fn set_items_per_page(&self, items_per_page: usize) -> Result<(), InspectorError> {
        if items_per_page == 0 {
            return Err(InspectorError::InvalidPageSize);
        }
        {
            let mut view = self.lock_view();
            let count = view.results.len();
            view.page.resize(items_per_page, count);
        }
        self.reload().await;
        Ok(())
    }

    /// Schedules a search after the debounce window.
    ///
    /// A newer call cancels this one before it runs, and any query already in
    /// flight is invalidated immediately, so rapid keystrokes produce at most
    /// one query for the final text.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn set_search(&self, text: impl Into<String>) {
        let text = text.into();
        let search_ticket = {
            let mut view = self.lock_view();
            view.begin();
            view.search_generation += 1;
            view.search_generation
        };

        let controller = self.clone();
        let delay = self.inner.debounce;
        self.inner.search.schedule(async move {
            tokio::time::sleep(delay).await;
            controller.apply_search(search_ticket, text).await;
        });
    }

    /// Waits until any pending debounced search has finished.
    pub async fn settle(&self) {
        self.inner.search.settle().await;
    }

    /// Reveals the next page, appending it to the displayed rows.
    ///
    /// Publishes `Loading` (keeping the rows already shown), then `Loaded`
    /// with the next page appended. Returns `false` without publishing when
    /// nothing is loaded or the last page is already shown, and `false` when
    /// the result was replaced while waiting; the replacing operation then
    /// owns the published state.
    pub async fn load_more(&self) -> bool {
        let ticket = {
            let mut view = self.lock_view();
            if view.phase != Phase::Loaded || !view.page.has_more() {
                return false;
            }
            view.phase = Phase::Loading;
            self.publish(&view);
            view.generation
        };

        // Let other work on the presentation thread run first; a reload or
        // clear that lands in between makes this request stale.
        tokio::task::yield_now().await;

        let mut view = self.lock_view();
        if view.generation != ticket {
            debug!("discarding stale load-more for generation {}", ticket);
            return false;
        }
        view.phase = Phase::Loaded;
        if !view.page.advance() {
            self.publish(&view);
            return false;
        }

        let View {
            results,
            displayed,
            page,
            ..
        } = &mut *view;
        let next: Vec<Arc<Transaction>> = {
            let shown: HashSet<&str> = displayed.iter().map(|t| t.id.as_str()).collect();
            Paginator::slice(results.as_slice(), page.current_page, page.items_per_page)
                .iter()
                .filter(|t| !shown.contains(t.id.as_str()))
                .cloned()
                .collect()
        };
        displayed.extend(next);

        self.publish(&view);
        true
    }

    /// Deletes every captured transaction and reloads.
    pub async fn clear_all(&self) {
        let ticket = self.lock_view().begin();

        let store = Arc::clone(&self.inner.store);
        let deleted = tokio::task::spawn_blocking(move || store.delete_all())
            .await
            .map_err(|e| InspectorError::Task(e.to_string()))
            .and_then(|result| result.map_err(InspectorError::from));

        match deleted {
            Ok(()) => {
                info!("cleared captured traffic");
                self.reload().await;
            }
            Err(err) => self.apply(ticket, Err(err)),
        }
    }

    /// Point lookup for a detail view.
    pub fn transaction(&self, id: &str) -> Result<Option<Arc<Transaction>>, InspectorError> {
        Ok(self.inner.store.get(id)?)
    }

    /// Statistics over the full filtered result.
    pub fn stats(&self) -> TransactionStats {
        TransactionStats::collect(&self.lock_view().results)
    }

    async fn apply_search(&self, search_ticket: u64, text: String) {
        {
            let mut view = self.lock_view();
            if view.search_generation != search_ticket {
                debug!("search for {:?} superseded", text);
                return;
            }
            view.filter.search_term = if text.trim().is_empty() {
                None
            } else {
                Some(text)
            };
        }
        self.reload().await;
    }

    async fn run_query(&self, filter: Filter) -> Result<Vec<Arc<Transaction>>, InspectorError> {
        let store = Arc::clone(&self.inner.store);
        let engine = Arc::clone(&self.inner.engine);

        tokio::task::spawn_blocking(move || -> Result<Vec<Arc<Transaction>>, InspectorError> {
            let snapshot = store.snapshot()?;
            Ok(engine.filter(snapshot.as_slice(), &filter))
        })
        .await
        .map_err(|e| InspectorError::Task(e.to_string()))?
    }

    /// Publishes the outcome of the query started with `ticket`, if still current.
    fn apply(&self, ticket: u64, result: Result<Vec<Arc<Transaction>>, InspectorError>) {
        let mut view = self.lock_view();
        if view.generation != ticket {
            debug!(
                "discarding stale result for generation {} (current {})",
                ticket, view.generation
            );
            return;
        }

        match result {
            Ok(results) => {
                view.page.reset(results.len());
                view.displayed = Paginator::slice(&results, 0, view.page.items_per_page).to_vec();
                view.results = results;
                view.phase = Phase::Loaded;
                view.error = None;
                debug!(
                    "loaded {} transactions ({} pages)",
                    view.results.len(),
                    view.page.total_pages
                );
            }
            Err(err) => {
                warn!("inspector query failed: {}", err);
                view.phase = Phase::Error;
                view.error = Some(Arc::new(err));
            }
        }

        self.publish(&view);
    }

    /// Sends the current view. Callers hold the view lock, which keeps
    /// publications in generation order.
    fn publish(&self, view: &View) {
        let state = InspectorState {
            phase: view.phase,
            transactions: view.displayed.clone(),
            is_loading: view.phase == Phase::Loading,
            error: view.error.clone(),
            has_more_pages: view.phase == Phase::Loaded && view.page.has_more(),
            page: view.page,
            total_count: view.results.len(),
            filter: view.filter.clone(),
            version: view.generation,
        };
        self.inner.state_tx.send_replace(state);
    }

    fn lock_view(&self) -> MutexGuard<'_, View> {
        self.inner
            .view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl View {
    /// Starts a new generation, invalidating every in-flight result.
    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

impl std::fmt::Debug for InspectorController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let view = self.lock_view();
        f.debug_struct("InspectorController")
            .field("phase", &view.phase)
            .field("filter", &view.filter)
            .field("page", &view.page)
            .field("generation", &view.generation)
            .finish()
    }
}
