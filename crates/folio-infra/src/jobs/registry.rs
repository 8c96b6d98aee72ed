//! Job registry: definitions, enable flags, fire times and the running set.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use serde::Serialize;
use tokio::sync::RwLock;

use folio_core::JobError;
use folio_core::ports::{Cadence, Clock, JobDefinition, JobHandler, JobResult};

struct JobEntry {
    name: String,
    cadence: Cadence,
    handler: Arc<dyn JobHandler>,
    enabled: bool,
    next_fire_at: DateTime<Utc>,
    last_started_at: Option<DateTime<Utc>>,
    last_outcome: Option<JobResult>,
}

/// A job whose cadence elapsed on this tick.
pub struct DueJob {
    pub id: String,
    pub handler: Arc<dyn JobHandler>,
}

/// Snapshot of one registered job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub id: String,
    pub name: String,
    pub cadence: String,
    pub enabled: bool,
    pub is_running: bool,
    pub next_fire_at: DateTime<Utc>,
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<JobResult>,
}

/// Registered jobs keyed by id.
///
/// The running set is separate from the job table so the single-flight check
/// is one atomic insert and never waits on the table lock.
pub struct JobRegistry {
    clock: Arc<dyn Clock>,
    jobs: RwLock<HashMap<String, JobEntry>>,
    running: DashSet<String>,
}

impl JobRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            jobs: RwLock::new(HashMap::new()),
            running: DashSet::new(),
        }
    }

    /// Add or replace a job.
    pub async fn register(&self, def: JobDefinition) -> Result<(), JobError> {
        def.cadence.validate()?;
        let now = self.clock.now();

        let mut jobs = self.jobs.write().await;
        let previous = jobs.remove(&def.id);

        let enabled = def
            .enabled
            .or_else(|| previous.as_ref().map(|p| p.enabled))
            .unwrap_or(true);
        let (next_fire_at, last_started_at, last_outcome) = match previous {
            Some(p) if p.cadence == def.cadence => {
                (p.next_fire_at, p.last_started_at, p.last_outcome)
            }
            Some(p) => (def.cadence.first_fire(now), p.last_started_at, p.last_outcome),
            None => (def.cadence.first_fire(now), None, None),
        };

        tracing::info!(
            job_id = %def.id,
            cadence = %def.cadence,
            enabled,
            next_fire_at = %next_fire_at,
            "Job registered"
        );

        jobs.insert(
            def.id,
            JobEntry {
                name: def.name,
                cadence: def.cadence,
                handler: def.handler,
                enabled,
                next_fire_at,
                last_started_at,
                last_outcome,
            },
        );
        Ok(())
    }

    /// Remove a job. Returns `false` if it was not registered.
    pub async fn unregister(&self, id: &str) -> bool {
        let removed = self.jobs.write().await.remove(id).is_some();
        if removed {
            tracing::info!(job_id = %id, "Job unregistered");
        }
        removed
    }

    pub async fn enable(&self, id: &str) -> Result<(), JobError> {
        self.set_enabled(id, true).await
    }

    pub async fn disable(&self, id: &str) -> Result<(), JobError> {
        self.set_enabled(id, false).await
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().await;
        let entry = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;
        entry.enabled = enabled;
        tracing::info!(job_id = %id, enabled, "Job toggled");
        Ok(())
    }

    /// Claim the single-flight slot for `id`. `false` means already running.
    pub fn try_mark_running(&self, id: &str) -> bool {
        self.running.insert(id.to_string())
    }

    pub fn clear_running(&self, id: &str) {
        self.running.remove(id);
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.running.contains(id)
    }

    /// Enabled jobs whose fire time is at or before `now`.
    ///
    /// Each returned job has its next fire time advanced past `now`, whether
    /// or not the caller manages to dispatch it.
    pub async fn take_due(&self, now: DateTime<Utc>) -> Vec<DueJob> {
        let mut jobs = self.jobs.write().await;
        let mut due: Vec<DueJob> = jobs
            .iter_mut()
            .filter(|(_, entry)| entry.enabled && entry.next_fire_at <= now)
            .map(|(id, entry)| {
                entry.next_fire_at = entry.cadence.next_fire_after(now);
                DueJob {
                    id: id.clone(),
                    handler: entry.handler.clone(),
                }
            })
            .collect();
        due.sort_by(|a, b| a.id.cmp(&b.id));
        due
    }

    pub async fn handler(&self, id: &str) -> Option<Arc<dyn JobHandler>> {
        self.jobs.read().await.get(id).map(|e| e.handler.clone())
    }

    pub async fn record_start(&self, id: &str, started_at: DateTime<Utc>) {
        if let Some(entry) = self.jobs.write().await.get_mut(id) {
            entry.last_started_at = Some(started_at);
        }
    }

    pub async fn record_outcome(&self, id: &str, outcome: JobResult) {
        if let Some(entry) = self.jobs.write().await.get_mut(id) {
            entry.last_outcome = Some(outcome);
        }
    }

    /// All jobs, sorted by id.
    pub async fn status(&self) -> Vec<JobStatus> {
        let jobs = self.jobs.read().await;
        let mut status: Vec<JobStatus> = jobs
            .iter()
            .map(|(id, entry)| JobStatus {
                id: id.clone(),
                name: entry.name.clone(),
                cadence: entry.cadence.to_string(),
                enabled: entry.enabled,
                is_running: self.is_running(id),
                next_fire_at: entry.next_fire_at,
                last_started_at: entry.last_started_at,
                last_outcome: entry.last_outcome.clone(),
            })
            .collect();
        status.sort_by(|a, b| a.id.cmp(&b.id));
        status
    }

    /// Drop every job and running mark.
    pub async fn clear(&self) {
        self.jobs.write().await.clear();
        self.running.clear();
    }
}
