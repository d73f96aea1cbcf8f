//! Per-user dashboard sessions
//!
//! Each signed-in user gets one `DashboardSession`, created and started on
//! first use and dropped on sign-out. Filter state therefore lives across
//! requests the way it lives across renders in a browser session.
//!
//! A session that goes unused for longer than the idle timeout is evicted on
//! the next sweep. Sweeps run whenever a new session is started and from the
//! readiness check.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use core_kernel::UserId;
use domain_policy::{DashboardResult, DashboardSession, DataGateway, PolicyQueryService};

/// Default idle time before a session is evicted
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct Entry {
    session: Arc<DashboardSession>,
    last_used: Mutex<Instant>,
}

impl Entry {
    fn new(session: Arc<DashboardSession>) -> Self {
        Self {
            session,
            last_used: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) -> Arc<DashboardSession> {
        if let Ok(mut last_used) = self.last_used.lock() {
            *last_used = Instant::now();
        }
        Arc::clone(&self.session)
    }

    fn idle_for(&self, now: Instant) -> Duration {
        self.last_used
            .lock()
            .map(|last_used| now.saturating_duration_since(*last_used))
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct DashboardSessions {
    gateway: Arc<dyn DataGateway>,
    idle_timeout: Duration,
    sessions: Arc<RwLock<HashMap<UserId, Entry>>>,
}

impl DashboardSessions {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self::with_idle_timeout(gateway, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(gateway: Arc<dyn DataGateway>, idle_timeout: Duration) -> Self {
        Self {
            gateway,
            idle_timeout,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The user's session, starting a new one if none exists
    ///
    /// A session whose first load failed is kept; it has no snapshot yet and
    /// the caller's next request retries the load.
    pub async fn get_or_start(&self, user: &UserId) -> DashboardResult<Arc<DashboardSession>> {
        if let Some(entry) = self.sessions.read().await.get(user) {
            return Ok(entry.touch());
        }

        let session = {
            let mut sessions = self.sessions.write().await;
            if let Some(entry) = sessions.get(user) {
                return Ok(entry.touch());
            }
            let evicted = evict_idle(&mut sessions, self.idle_timeout);
            if evicted > 0 {
                debug!(evicted, "Evicted idle dashboard sessions");
            }

            let service = PolicyQueryService::new(Arc::clone(&self.gateway)).on_behalf_of(user.as_str());
            let session = Arc::new(DashboardSession::with_service(service));
            sessions.insert(user.clone(), Entry::new(Arc::clone(&session)));
            session
        };

        info!(user_id = %user, "Starting dashboard session");
        if let Err(e) = session.start().await {
            warn!(user_id = %user, error = %e, "Initial dashboard load failed");
            return Err(e);
        }
        Ok(session)
    }

    /// Drops the user's session; returns whether one existed
    pub async fn end(&self, user: &UserId) -> bool {
        self.sessions.write().await.remove(user).is_some()
    }

    /// Drops every session idle longer than the timeout; returns how many
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        evict_idle(&mut sessions, self.idle_timeout)
    }

    pub async fn active(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn evict_idle(sessions: &mut HashMap<UserId, Entry>, idle_timeout: Duration) -> usize {
    let now = Instant::now();
    let before = sessions.len();
    sessions.retain(|_, entry| entry.idle_for(now) < idle_timeout);
    before - sessions.len()
}
