//! Job runner: single-flight dispatch of job handlers.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use folio_core::JobError;
use folio_core::ports::{Clock, JobHandler, JobResult};

use super::registry::JobRegistry;

/// Holds the running mark for one job and releases it on drop.
struct RunningGuard {
    registry: Arc<JobRegistry>,
    id: String,
}

impl RunningGuard {
    fn acquire(registry: &Arc<JobRegistry>, id: &str) -> Option<Self> {
        registry.try_mark_running(id).then(|| Self {
            registry: registry.clone(),
            id: id.to_string(),
        })
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.registry.clear_running(&self.id);
    }
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Tick,
    Manual,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::Manual => "manual",
        }
    }
}

/// An execution started by [`JobRunner::on_tick`].
pub struct Dispatched {
    pub job_id: String,
    pub handle: JoinHandle<JobResult>,
}

/// Dispatches due jobs, one execution per job id at a time.
pub struct JobRunner {
    registry: Arc<JobRegistry>,
    clock: Arc<dyn Clock>,
    tracker: TaskTracker,
}

impl JobRunner {
    pub fn new(registry: Arc<JobRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry,
            clock,
            tracker: TaskTracker::new(),
        }
    }

    /// Tracker of every execution this runner has spawned.
    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Start every enabled job whose cadence elapsed at `now`.
    ///
    /// Jobs still running from an earlier firing are skipped, not queued.
    pub async fn on_tick(&self, now: DateTime<Utc>) -> Vec<Dispatched> {
        let mut dispatched = Vec::new();

        for job in self.registry.take_due(now).await {
            let Some(guard) = RunningGuard::acquire(&self.registry, &job.id) else {
                tracing::info!(job_id = %job.id, "Job skipped, still running");
                continue;
            };

            let handle = self.tracker.spawn(execute(
                self.registry.clone(),
                guard,
                job.handler,
                now,
                Trigger::Tick,
            ));
            dispatched.push(Dispatched {
                job_id: job.id,
                handle,
            });
        }

        dispatched
    }

    /// Run a job immediately and wait for it.
    ///
    /// Returns `Ok(false)` without running when the job is already executing.
    /// Disabled jobs still run.
    pub async fn run_now(&self, id: &str) -> Result<bool, JobError> {
        let handler = self
            .registry
            .handler(id)
            .await
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;

        let Some(guard) = RunningGuard::acquire(&self.registry, id) else {
            tracing::info!(job_id = %id, "Manual run skipped, job busy");
            return Ok(false);
        };

        let now = self.clock.now();
        let handle = self.tracker.spawn(execute(
            self.registry.clone(),
            guard,
            handler,
            now,
            Trigger::Manual,
        ));
        if let Err(e) = handle.await {
            tracing::error!(job_id = %id, error = %e, "Manual run task aborted");
        }

        Ok(true)
    }
}

async fn execute(
    registry: Arc<JobRegistry>,
    guard: RunningGuard,
    handler: Arc<dyn JobHandler>,
    now: DateTime<Utc>,
    trigger: Trigger,
) -> JobResult {
    let job_id = guard.id.clone();
    registry.record_start(&job_id, now).await;
    let started = Instant::now();

    let outcome = match tokio::spawn(async move { handler.run(now).await }).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            JobResult::failed(format!("handler panicked: {}", panic_message(&*e.into_panic())))
        }
        Err(e) => JobResult::failed(format!("handler task cancelled: {e}")),
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        JobResult::Completed { processed } if *processed > 0 => tracing::info!(
            job_id = %job_id,
            trigger = trigger.as_str(),
            processed,
            elapsed_ms,
            "Job completed"
        ),
        JobResult::Completed { processed } => tracing::debug!(
            job_id = %job_id,
            trigger = trigger.as_str(),
            processed,
            elapsed_ms,
            "Job completed"
        ),
        JobResult::Failed { reason } => tracing::error!(
            job_id = %job_id,
            trigger = trigger.as_str(),
            reason = %reason,
            elapsed_ms,
            "Job failed"
        ),
    }

    registry.record_outcome(&job_id, outcome.clone()).await;
    drop(guard);
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use folio_core::ports::{Cadence, JobDefinition, ManualClock};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Blocks until released and tracks how many runs overlap.
    #[derive(Default)]
    struct GatedHandler {
        gate: Notify,
        started: Notify,
        active: AtomicUsize,
        max_active: AtomicUsize,
        runs: AtomicUsize,
    }

    #[async_trait]
    impl JobHandler for GatedHandler {
        async fn run(&self, _now: DateTime<Utc>) -> JobResult {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.gate.notified().await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            JobResult::Completed { processed: 1 }
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

    struct PanicHandler;

    #[async_trait]
    impl JobHandler for PanicHandler {
        async fn run(&self, _now: DateTime<Utc>) -> JobResult {
            panic!("boom");
        }
    }

    #[derive(Default)]
    struct CountingHandler {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn run(&self, _now: DateTime<Utc>) -> JobResult {
            let runs = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            JobResult::Completed { processed: runs }
        }
    }

    async fn setup(
        handler: Arc<dyn JobHandler>,
        enabled: bool,
    ) -> (Arc<ManualClock>, Arc<JobRegistry>, JobRunner) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        ));
        let registry = Arc::new(JobRegistry::new(clock.clone()));
        registry
            .register(
                JobDefinition::new("job", "Test job", Cadence::every_secs(1), handler)
                    .enabled(enabled),
            )
            .await
            .unwrap();
        let runner = JobRunner::new(registry.clone(), clock.clone());
        (clock, registry, runner)
    }

    #[tokio::test]
    async fn test_tick_skips_job_that_is_still_running() {
        let handler = Arc::new(GatedHandler::default());
        let (clock, registry, runner) = setup(handler.clone(), true).await;

        let first = runner.on_tick(clock.now()).await;
        assert_eq!(first.len(), 1);
        handler.started.notified().await;

        for _ in 0..3 {
            clock.advance(chrono::TimeDelta::seconds(1));
            assert!(runner.on_tick(clock.now()).await.is_empty());
        }

        handler.gate.notify_one();
        for d in first {
            assert_eq!(d.handle.await.unwrap(), JobResult::Completed { processed: 1 });
        }

        assert_eq!(handler.runs.load(Ordering::SeqCst), 1);
        assert_eq!(handler.max_active.load(Ordering::SeqCst), 1);
        assert!(!registry.is_running("job"));
    }

    #[tokio::test]
    async fn test_run_now_reports_busy_while_tick_run_in_flight() {
        let handler = Arc::new(GatedHandler::default());
        let (clock, _registry, runner) = setup(handler.clone(), true).await;

        let dispatched = runner.on_tick(clock.now()).await;
        handler.started.notified().await;

        assert_eq!(runner.run_now("job").await, Ok(false));

        handler.gate.notify_one();
        for d in dispatched {
            d.handle.await.unwrap();
        }
        assert_eq!(handler.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_run_now_executes_once() {
        let handler = Arc::new(SleepHandler(Duration::from_millis(100)));
        let (_, _, runner) = setup(handler, true).await;

        let (a, b) = tokio::join!(runner.run_now("job"), runner.run_now("job"));
        let mut results = vec![a.unwrap(), b.unwrap()];
        results.sort();

        assert_eq!(results, vec![false, true]);
    }

    #[tokio::test]
    async fn test_run_now_unknown_job_is_not_found() {
        let (_, _, runner) = setup(Arc::new(SleepHandler(Duration::ZERO)), true).await;

        assert_eq!(
            runner.run_now("missing").await,
            Err(JobError::NotFound("missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_panic_is_contained_and_releases_mark() {
        let (clock, registry, runner) = setup(Arc::new(PanicHandler), true).await;

        let dispatched = runner.on_tick(clock.now()).await;
        for d in dispatched {
            let outcome = d.handle.await.unwrap();
            assert!(matches!(outcome, JobResult::Failed { ref reason } if reason.contains("boom")));
        }

        assert!(!registry.is_running("job"));
        let status = registry.status().await;
        assert!(matches!(status[0].last_outcome, Some(JobResult::Failed { .. })));

        assert_eq!(runner.run_now("job").await, Ok(true));
    }

    #[tokio::test]
    async fn test_disabled_job_runs_only_on_demand() {
        let handler = Arc::new(GatedHandler::default());
        let (clock, _, runner) = setup(handler.clone(), false).await;

        assert!(runner.on_tick(clock.now()).await.is_empty());

        handler.gate.notify_one();
        assert_eq!(runner.run_now("job").await, Ok(true));
        assert_eq!(handler.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_stop_other_jobs() {
        let counter = Arc::new(CountingHandler::default());
        let (clock, registry, runner) = setup(counter.clone(), true).await;
        registry
            .register(JobDefinition::new(
                "broken",
                "Always panics",
                Cadence::every_secs(1),
                Arc::new(PanicHandler),
            ))
            .await
            .unwrap();

        for tick in 1..=3 {
            let dispatched = runner.on_tick(clock.now()).await;
            assert_eq!(dispatched.len(), 2);

            for d in dispatched {
                let outcome = d.handle.await.unwrap();
                match d.job_id.as_str() {
                    "broken" => assert!(matches!(outcome, JobResult::Failed { .. })),
                    _ => assert_eq!(outcome, JobResult::Completed { processed: tick }),
                }
            }
            clock.advance(chrono::TimeDelta::seconds(1));
        }

        assert_eq!(counter.runs.load(Ordering::SeqCst), 3);
        assert!(!registry.is_running("broken"));
        assert!(!registry.is_running("job"));
    }
}
