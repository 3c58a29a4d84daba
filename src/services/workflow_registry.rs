//! In-progress workflow runs hosted by the server.
//!
//! Each run is owned by the email of the session that started it. Lookups
//! from any other session behave as if the run did not exist. Runs that see
//! no request for longer than the configured TTL are evicted by
//! [`start_eviction_task`].

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tokio::time::interval;
use tracing::info;
use uuid::Uuid;

use super::session::SessionWatch;
use crate::config::RunRetention;
use crate::error::{AppError, AppResult};
use crate::models::Session;
use crate::workflow::{Collaborators, ReportWorkflow};

/// A hosted run. The workflow mutex serializes requests against one run.
pub struct RunHandle {
    pub id: Uuid,
    owner: String,
    sessions: SessionWatch,
    touched: std::sync::Mutex<Instant>,
    pub workflow: Mutex<ReportWorkflow>,
}

impl RunHandle {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn touch(&self) {
        *self.touched.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let touched = *self.touched.lock().unwrap_or_else(PoisonError::into_inner);
        now.saturating_duration_since(touched)
    }
}

pub struct WorkflowRegistry {
    collaborators: Collaborators,
    runs: RwLock<HashMap<Uuid, Arc<RunHandle>>>,
}

impl WorkflowRegistry {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            runs: RwLock::new(HashMap::new()),
        }
    }

    /// Start a run for `session`, restoring that officer's draft.
    pub async fn start(&self, session: Session) -> AppResult<Arc<RunHandle>> {
        let owner = owner_of(&session)?;
        let sessions = SessionWatch::new(Some(session));
        let workflow = ReportWorkflow::start(self.collaborators.clone(), &sessions).await;

        let handle = Arc::new(RunHandle {
            id: Uuid::new_v4(),
            owner,
            sessions,
            touched: std::sync::Mutex::new(Instant::now()),
            workflow: Mutex::new(workflow),
        });

        self.runs.write().await.insert(handle.id, handle.clone());
        tracing::info!(run_id = %handle.id, owner = %handle.owner, "Workflow run started");
        Ok(handle)
    }

    /// Run `id` if it belongs to `session`. The run sees `session` as its
    /// current session from now on.
    pub async fn get(&self, id: Uuid, session: &Session) -> AppResult<Arc<RunHandle>> {
        let owner = owner_of(session)?;
        let handle = self
            .runs
            .read()
            .await
            .get(&id)
            .filter(|handle| handle.owner == owner)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Workflow {}", id)))?;

        handle.sessions.publish(Some(session.clone()));
        handle.touch();
        Ok(handle)
    }

    /// Forget run `id` if it belongs to `session`.
    pub async fn remove(&self, id: Uuid, session: &Session) -> AppResult<Arc<RunHandle>> {
        let owner = owner_of(session)?;
        let mut runs = self.runs.write().await;
        match runs.get(&id) {
            Some(handle) if handle.owner == owner => {}
            _ => return Err(AppError::NotFound(format!("Workflow {}", id))),
        }
        let handle = runs
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Workflow {}", id)))?;
        tracing::info!(run_id = %id, "Workflow run closed");
        Ok(handle)
    }

    pub async fn len(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Drop runs that have not been requested for `ttl`. Returns how many
    /// were dropped.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        self.evict_idle_at(Instant::now(), ttl).await
    }

    async fn evict_idle_at(&self, now: Instant, ttl: Duration) -> usize {
        let mut runs = self.runs.write().await;
        let before = runs.len();
        runs.retain(|id, handle| {
            let keep = handle.idle_for(now) < ttl;
            if !keep {
                tracing::info!(run_id = %id, owner = %handle.owner, "Evicting idle workflow run");
            }
            keep
        });
        before - runs.len()
    }
}

/// Start the background task that evicts idle runs.
pub fn start_eviction_task(registry: Arc<WorkflowRegistry>, retention: RunRetention) {
    tokio::spawn(async move {
        info!(
            "Starting run eviction (ttl: {} seconds, interval: {} seconds)",
            retention.ttl_secs, retention.sweep_interval_secs
        );

        let ttl = Duration::from_secs(retention.ttl_secs);
        let mut ticker = interval(Duration::from_secs(retention.sweep_interval_secs));

        loop {
            ticker.tick().await;

            let evicted = registry.evict_idle(ttl).await;
            if evicted > 0 {
                info!("Evicted {} idle workflow runs", evicted);
            }
        }
    });
}

fn owner_of(session: &Session) -> AppResult<String> {
    session
        .authenticated_email()
        .map(str::to_lowercase)
        .ok_or_else(|| AppError::Unauthorized("Session has no email".to_string()))
}
