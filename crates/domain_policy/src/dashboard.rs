//! Dashboard load cycle
//!
//! Each load takes a generation number from a monotonically increasing
//! counter. When its response arrives, the load is applied only if no newer
//! load has been issued in the meantime; otherwise the response is dropped.
//! This keeps a slow, stale response from overwriting a newer view when the
//! filters change while a load is in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::aggregation::DashboardView;
use crate::error::DashboardResult;
use crate::filters::{FilterCriteria, FilterKey, FilterOptions, FilterStateController};
use crate::ports::DataGateway;
use crate::services::PolicyQueryService;

/// A fully aggregated view together with the criteria that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub generation: u64,
    pub criteria: FilterCriteria,
    pub view: DashboardView,
}

/// Result of one load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The snapshot was published
    Applied(Arc<DashboardSnapshot>),
    /// A newer load was issued before this one finished; nothing was published
    Superseded { generation: u64 },
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied(_))
    }

    pub fn snapshot(&self) -> Option<&Arc<DashboardSnapshot>> {
        match self {
            LoadOutcome::Applied(snapshot) => Some(snapshot),
            LoadOutcome::Superseded { .. } => None,
        }
    }
}

/// Fetches, aggregates, and publishes dashboard snapshots
pub struct DashboardLoader {
    service: PolicyQueryService,
    generation: AtomicU64,
    snapshot: watch::Sender<Option<Arc<DashboardSnapshot>>>,
}

impl DashboardLoader {
    pub fn new(service: PolicyQueryService) -> Self {
        let (snapshot, _) = watch::channel(None);
        Self {
            service,
            generation: AtomicU64::new(0),
            snapshot,
        }
    }

    /// Generation of the most recently issued load
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Last published snapshot, if any load has succeeded
    pub fn latest(&self) -> Option<Arc<DashboardSnapshot>> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<DashboardSnapshot>>> {
        self.snapshot.subscribe()
    }

    /// Loads and aggregates the policies matching `criteria`
    ///
    /// # Errors
    ///
    /// `QueryFailed` when this is still the newest load and the gateway fails.
    /// The previously published snapshot stays in place.
    pub async fn load(&self, criteria: &FilterCriteria) -> DashboardResult<LoadOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Dashboard load started");

        let result = self.service.fetch_matching(criteria).await;

        if self.is_stale(generation) {
            debug!(generation, latest = self.current_generation(), "Discarding stale dashboard load");
            return Ok(LoadOutcome::Superseded { generation });
        }

        let rows = match result {
            Ok(rows) => rows,
            Err(e) => {
                warn!(generation, error = %e, "Dashboard load failed; keeping previous view");
                return Err(e);
            }
        };

        let snapshot = Arc::new(DashboardSnapshot {
            generation,
            criteria: criteria.clone(),
            view: DashboardView::from_rows(rows),
        });

        // The staleness check is repeated under the channel lock so a newer
        // load that finished first is never overwritten.
        let published = self.snapshot.send_if_modified(|current| {
            let newer_published = current
                .as_ref()
                .is_some_and(|existing| existing.generation > generation);
            if newer_published || self.is_stale(generation) {
                return false;
            }
            *current = Some(Arc::clone(&snapshot));
            true
        });

        if !published {
            debug!(generation, "Discarding stale dashboard load");
            return Ok(LoadOutcome::Superseded { generation });
        }

        info!(
            generation,
            total = snapshot.view.summary.total,
            "Dashboard view published"
        );
        Ok(LoadOutcome::Applied(snapshot))
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}

/// One user's dashboard: filter state plus the load cycle driven by it
pub struct DashboardSession {
    filters: FilterStateController,
    loader: DashboardLoader,
}

impl DashboardSession {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self::with_service(PolicyQueryService::new(gateway))
    }

    pub fn with_service(service: PolicyQueryService) -> Self {
        Self {
            filters: FilterStateController::new(Arc::clone(service.gateway())),
            loader: DashboardLoader::new(service),
        }
    }

    pub fn filters(&self) -> &FilterStateController {
        &self.filters
    }

    pub fn loader(&self) -> &DashboardLoader {
        &self.loader
    }

    /// Loads the option lists and the initial view
    pub async fn start(&self) -> DashboardResult<LoadOutcome> {
        self.filters.load_options().await;
        self.reload().await
    }

    /// Sets one filter and reloads the view with the new criteria
    pub async fn apply_filter(&self, key: FilterKey, value: &str) -> DashboardResult<LoadOutcome> {
        let criteria = self.filters.set_filter(key, value)?;
        self.loader.load(&criteria).await
    }

    /// Clears every filter and reloads
    pub async fn reset_filters(&self) -> DashboardResult<LoadOutcome> {
        let criteria = self.filters.reset();
        self.loader.load(&criteria).await
    }

    /// Reloads with the current criteria
    pub async fn reload(&self) -> DashboardResult<LoadOutcome> {
        let criteria = self.filters.criteria();
        self.loader.load(&criteria).await
    }

    pub fn options(&self) -> FilterOptions {
        self.filters.options()
    }

    pub fn latest(&self) -> Option<Arc<DashboardSnapshot>> {
        self.loader.latest()
    }
}
