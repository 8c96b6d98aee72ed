//! Scheduler: owns the job registry, the runner and the ticker task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use folio_core::JobError;
use folio_core::ports::{Cadence, Clock, ContentRepository, JobDefinition, PublicationListener};
use folio_core::services::{
    LifecycleService, PUBLISH_DUE_JOB_ID, PURGE_EXPIRED_TRASH_JOB_ID, PublishDueJob,
    PurgeExpiredTrashJob,
};

use super::config::SchedulerConfig;
use super::registry::{JobRegistry, JobStatus};
use super::runner::JobRunner;

/// Why a manual run did not execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunNowReason {
    NotFound,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunNowOutcome {
    pub executed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RunNowReason>,
}

/// Periodic job scheduler.
///
/// The binary builds exactly one and drives it with [`Scheduler::start`] and
/// [`Scheduler::shutdown`].
pub struct Scheduler {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    repo: Arc<dyn ContentRepository>,
    lifecycle: Arc<LifecycleService>,
    listener: Option<Arc<dyn PublicationListener>>,
    registry: Arc<JobRegistry>,
    runner: Arc<JobRunner>,
    cancel: CancellationToken,
    ticker: Mutex<Option<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
        repo: Arc<dyn ContentRepository>,
        lifecycle: Arc<LifecycleService>,
    ) -> Self {
        let registry = Arc::new(JobRegistry::new(clock.clone()));
        let runner = Arc::new(JobRunner::new(registry.clone(), clock.clone()));

        Self {
            config,
            clock,
            repo,
            lifecycle,
            listener: None,
            registry,
            runner,
            cancel: CancellationToken::new(),
            ticker: Mutex::new(None),
            stopped: AtomicBool::new(false),
        }
    }

    /// Forward scheduled publications to `listener`.
    pub fn with_listener(mut self, listener: Arc<dyn PublicationListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn runner(&self) -> &Arc<JobRunner> {
        &self.runner
    }

    /// Register the built-in jobs. Safe to call more than once.
    pub async fn register_default_jobs(&self) -> Result<(), JobError> {
        let mut publish_due = PublishDueJob::new(self.repo.clone());
        if let Some(listener) = &self.listener {
            publish_due = publish_due.with_listener(listener.clone());
        }
        self.registry
            .register(JobDefinition::new(
                PUBLISH_DUE_JOB_ID,
                "Publish due posts",
                Cadence::Every(self.config.publish_interval),
                Arc::new(publish_due),
            ))
            .await?;

        match self.config.trash_retention {
            Some(retention) => {
                self.registry
                    .register(JobDefinition::new(
                        PURGE_EXPIRED_TRASH_JOB_ID,
                        "Purge expired trash",
                        Cadence::DailyAt {
                            hour: self.config.trash_purge_hour,
                            minute: 0,
                        },
                        Arc::new(PurgeExpiredTrashJob::new(self.lifecycle.clone(), retention)),
                    ))
                    .await?;
            }
            None => {
                self.registry.unregister(PURGE_EXPIRED_TRASH_JOB_ID).await;
            }
        }

        Ok(())
    }

    pub async fn register(&self, def: JobDefinition) -> Result<(), JobError> {
        self.registry.register(def).await
    }

    pub async fn enable(&self, id: &str) -> Result<(), JobError> {
        self.registry.enable(id).await
    }

    pub async fn disable(&self, id: &str) -> Result<(), JobError> {
        self.registry.disable(id).await
    }

    /// Run a job now, bypassing its cadence and enabled flag.
    pub async fn run_now(&self, id: &str) -> RunNowOutcome {
        match self.runner.run_now(id).await {
            Ok(true) => RunNowOutcome {
                executed: true,
                reason: None,
            },
            Ok(false) => RunNowOutcome {
                executed: false,
                reason: Some(RunNowReason::Busy),
            },
            Err(_) => RunNowOutcome {
                executed: false,
                reason: Some(RunNowReason::NotFound),
            },
        }
    }

    pub async fn get_status(&self) -> Vec<JobStatus> {
        self.registry.status().await
    }

    /// Spawn the ticker. No-op when disabled, already started or shut down.
    pub async fn start(&self) {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return;
        }
        if self.stopped.load(Ordering::SeqCst) {
            tracing::warn!("Scheduler already shut down, not starting");
            return;
        }

        let mut ticker = self.ticker.lock().await;
        if ticker.is_some() {
            return;
        }

        let runner = self.runner.clone();
        let clock = self.clock.clone();
        let cancel = self.cancel.clone();
        let period = self.config.tick_interval;

        *ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        runner.on_tick(clock.now()).await;
                    }
                }
            }
            tracing::debug!("Scheduler ticker stopped");
        }));

        tracing::info!(tick_ms = period.as_millis() as u64, "Scheduler started");
    }

    /// Stop ticking, wait for running jobs up to the grace period, then drop
    /// all registrations. Idempotent.
    pub async fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        self.cancel.cancel();
        if let Some(handle) = self.ticker.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Scheduler ticker ended abnormally");
            }
        }

        let tracker = self.runner.tracker();
        tracker.close();
        if tokio::time::timeout(self.config.shutdown_grace, tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                in_flight = tracker.len(),
                grace_secs = self.config.shutdown_grace.as_secs(),
                "Shutdown grace elapsed, abandoning running jobs"
            );
        }

        self.registry.clear().await;
        tracing::info!("Scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryContentRepository;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use folio_core::domain::{ContentItem, ContentStatus};
    use folio_core::ports::{BaseRepository, JobHandler, JobResult, ManualClock};
    use std::time::Duration;
    use uuid::Uuid;

    struct Fixture {
        clock: Arc<ManualClock>,
        repo: Arc<InMemoryContentRepository>,
        lifecycle: Arc<LifecycleService>,
        scheduler: Scheduler,
    }

    fn fixture(config: SchedulerConfig) -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        ));
        let repo = Arc::new(InMemoryContentRepository::new());
        let lifecycle = Arc::new(LifecycleService::new(repo.clone(), clock.clone()));
        let scheduler = Scheduler::new(config, clock.clone(), repo.clone(), lifecycle.clone());
        Fixture {
            clock,
            repo,
            lifecycle,
            scheduler,
        }
    }

    impl Fixture {
        async fn draft(&self) -> Uuid {
            let item = ContentItem::new_draft(
                Uuid::new_v4(),
                "Post".to_string(),
                "Body".to_string(),
                self.clock.now(),
            );
            self.repo.save(item).await.unwrap().id
        }

        async fn status_of(&self, id: Uuid) -> ContentStatus {
            self.lifecycle.get(id).await.unwrap().status
        }
    }

    struct SleepHandler(Duration);

    #[async_trait]
    impl JobHandler for SleepHandler {
        async fn run(&self, _now: DateTime<Utc>) -> JobResult {
            tokio::time::sleep(self.0).await;
            JobResult::Completed { processed: 0 }
        }
    }

    #[tokio::test]
    async fn test_scheduled_item_published_at_job_time() {
        let f = fixture(SchedulerConfig::default());
        f.scheduler.register_default_jobs().await.unwrap();
        let id = f.draft().await;

        let requested = f.clock.now() + TimeDelta::hours(1);
        f.lifecycle.schedule(id, requested).await.unwrap();
        assert_eq!(f.status_of(id).await, ContentStatus::Scheduled);

        f.clock.advance(TimeDelta::minutes(61));
        let ran_at = f.clock.now();
        let outcome = f.scheduler.run_now(PUBLISH_DUE_JOB_ID).await;
        assert!(outcome.executed);

        let item = f.lifecycle.get(id).await.unwrap();
        assert_eq!(item.status, ContentStatus::Published);
        assert_eq!(item.publish_at, Some(ran_at));
        assert_ne!(item.publish_at, Some(requested));

        let status = f.scheduler.get_status().await;
        let job = status.iter().find(|s| s.id == PUBLISH_DUE_JOB_ID).unwrap();
        assert_eq!(job.last_outcome, Some(JobResult::Completed { processed: 1 }));
        assert_eq!(job.last_started_at, Some(ran_at));
    }

    #[tokio::test]
    async fn test_past_schedule_published_on_next_tick() {
        let f = fixture(SchedulerConfig::default());
        f.scheduler.register_default_jobs().await.unwrap();
        let id = f.draft().await;

        let item = f
            .lifecycle
            .schedule(id, f.clock.now() - TimeDelta::minutes(5))
            .await
            .unwrap();
        assert!(folio_core::domain::lifecycle::is_due(&item, f.clock.now()));

        let dispatched = f.scheduler.runner().on_tick(f.clock.now()).await;
        for d in dispatched {
            d.handle.await.unwrap();
        }

        assert_eq!(f.status_of(id).await, ContentStatus::Published);
    }

    #[tokio::test]
    async fn test_trash_and_restore_published_item() {
        let f = fixture(SchedulerConfig::default());
        let id = f.draft().await;
        f.lifecycle.publish_now(id).await.unwrap();

        let trashed = f.lifecycle.trash(id).await.unwrap();
        assert_eq!(trashed.status, ContentStatus::Trashed);
        assert_eq!(trashed.prior_status, Some(ContentStatus::Published));

        let restored = f.lifecycle.restore(id).await.unwrap();
        assert_eq!(restored.status, ContentStatus::Published);
    }

    #[tokio::test]
    async fn test_concurrent_manual_runs_one_busy() {
        let f = fixture(SchedulerConfig::default());
        f.scheduler
            .register(JobDefinition::new(
                PUBLISH_DUE_JOB_ID,
                "Publish due posts",
                Cadence::every_secs(60),
                Arc::new(SleepHandler(Duration::from_millis(100))),
            ))
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            f.scheduler.run_now(PUBLISH_DUE_JOB_ID),
            f.scheduler.run_now(PUBLISH_DUE_JOB_ID)
        );

        let executed = [&a, &b].iter().filter(|o| o.executed).count();
        assert_eq!(executed, 1);
        let busy = if a.executed { b } else { a };
        assert_eq!(busy.reason, Some(RunNowReason::Busy));
    }

    #[tokio::test]
    async fn test_run_now_unknown_job() {
        let f = fixture(SchedulerConfig::default());

        let outcome = f.scheduler.run_now("missing").await;

        assert_eq!(
            outcome,
            RunNowOutcome {
                executed: false,
                reason: Some(RunNowReason::NotFound),
            }
        );
    }

    #[tokio::test]
    async fn test_default_jobs_registration_is_idempotent() {
        let f = fixture(SchedulerConfig::default());
        f.scheduler.register_default_jobs().await.unwrap();
        f.scheduler.disable(PUBLISH_DUE_JOB_ID).await.unwrap();

        f.scheduler.register_default_jobs().await.unwrap();

        let status = f.scheduler.get_status().await;
        let ids: Vec<&str> = status.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![PUBLISH_DUE_JOB_ID, PURGE_EXPIRED_TRASH_JOB_ID]);
        assert!(!status[0].enabled);
    }

    #[tokio::test]
    async fn test_zero_retention_skips_purge_job() {
        let f = fixture(SchedulerConfig {
            trash_retention: None,
            ..SchedulerConfig::default()
        });
        f.scheduler.register_default_jobs().await.unwrap();

        let status = f.scheduler.get_status().await;
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].id, PUBLISH_DUE_JOB_ID);
    }

    #[tokio::test]
    async fn test_ticker_publishes_due_item() {
        let f = fixture(SchedulerConfig {
            tick_interval: Duration::from_millis(10),
            ..SchedulerConfig::default()
        });
        f.scheduler.register_default_jobs().await.unwrap();
        let id = f.draft().await;
        f.lifecycle
            .schedule(id, f.clock.now() - TimeDelta::minutes(1))
            .await
            .unwrap();

        f.scheduler.start().await;
        let published = tokio::time::timeout(Duration::from_secs(2), async {
            while f.status_of(id).await != ContentStatus::Published {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        f.scheduler.shutdown().await;

        assert!(published.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_running_job_and_is_idempotent() {
        let f = fixture(SchedulerConfig::default());
        f.scheduler
            .register(JobDefinition::new(
                "slow",
                "Slow",
                Cadence::every_secs(60),
                Arc::new(SleepHandler(Duration::from_millis(50))),
            ))
            .await
            .unwrap();

        let dispatched = f.scheduler.runner().on_tick(f.clock.now()).await;
        assert_eq!(dispatched.len(), 1);

        f.scheduler.shutdown().await;
        assert!(f.scheduler.runner().tracker().is_empty());
        assert!(f.scheduler.get_status().await.is_empty());

        f.scheduler.shutdown().await;
        assert_eq!(
            f.scheduler.run_now("slow").await.reason,
            Some(RunNowReason::NotFound)
        );
    }

    #[tokio::test]
    async fn test_disabled_scheduler_does_not_tick() {
        let f = fixture(SchedulerConfig {
            enabled: false,
            tick_interval: Duration::from_millis(10),
            ..SchedulerConfig::default()
        });
        f.scheduler.register_default_jobs().await.unwrap();
        let id = f.draft().await;
        f.lifecycle
            .schedule(id, f.clock.now() - TimeDelta::minutes(1))
            .await
            .unwrap();

        f.scheduler.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(f.status_of(id).await, ContentStatus::Scheduled);
        assert!(f.scheduler.run_now(PUBLISH_DUE_JOB_ID).await.executed);
        assert_eq!(f.status_of(id).await, ContentStatus::Published);
    }
}
