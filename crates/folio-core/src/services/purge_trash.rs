//! Daily trash retention job.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use super::LifecycleService;
use crate::ports::{JobHandler, JobResult};

/// Registry id of the trash retention job.
pub const PURGE_EXPIRED_TRASH_JOB_ID: &str = "purge-expired-trash";

/// Permanently deletes items that have been in the trash longer than the
/// retention window.
pub struct PurgeExpiredTrashJob {
    lifecycle: Arc<LifecycleService>,
    retention: TimeDelta,
}

impl PurgeExpiredTrashJob {
    pub fn new(lifecycle: Arc<LifecycleService>, retention: TimeDelta) -> Self {
        Self {
            lifecycle,
            retention,
        }
    }
}

#[async_trait]
impl JobHandler for PurgeExpiredTrashJob {
    async fn run(&self, now: DateTime<Utc>) -> JobResult {
        let Some(cutoff) = now.checked_sub_signed(self.retention) else {
            return JobResult::Completed { processed: 0 };
        };
        let outcomes = match self.lifecycle.purge_expired(cutoff).await {
            Ok(outcomes) => outcomes,
            Err(e) => return JobResult::failed(e.to_string()),
        };

        let purged = outcomes.iter().filter(|o| o.is_ok()).count();
        let failed = outcomes.len() - purged;
        if failed > 0 {
            return JobResult::failed(format!(
                "{failed} of {} expired items could not be purged",
                outcomes.len()
            ));
        }
        JobResult::Completed { processed: purged }
    }
}
