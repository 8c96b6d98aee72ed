//! Publish-due job - moves scheduled content whose time has come to published.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ContentItem, PublishSource, lifecycle};
use crate::error::{LifecycleError, RepoError};
use crate::ports::{ContentRepository, JobHandler, JobResult, PublicationListener};

/// Registry id of the publish-due job.
pub const PUBLISH_DUE_JOB_ID: &str = "publish-due-posts";

/// What one invocation did.
#[derive(Debug, Default)]
pub struct PublishDueReport {
    pub published: Vec<Uuid>,
    /// Due items that were purged before their update landed.
    pub skipped: Vec<Uuid>,
    pub failed: Vec<(Uuid, LifecycleError)>,
}

/// Handler that publishes every scheduled item due at `now`.
///
/// Each item is saved on its own, so a failure part-way leaves earlier items
/// committed; the next run simply no longer sees them as due.
pub struct PublishDueJob {
    repo: Arc<dyn ContentRepository>,
    listener: Option<Arc<dyn PublicationListener>>,
}

impl PublishDueJob {
    pub fn new(repo: Arc<dyn ContentRepository>) -> Self {
        Self {
            repo,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn PublicationListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub async fn publish_due(&self, now: DateTime<Utc>) -> Result<PublishDueReport, LifecycleError> {
        let candidates = self.repo.find_scheduled_due_before(now).await?;
        let mut report = PublishDueReport::default();

        for item in candidates {
            // The storage query is only a pre-filter.
            if !lifecycle::is_due(&item, now) {
                continue;
            }

            let id = item.id;
            match self.publish_one(&item, now).await {
                Ok(Some(saved)) => {
                    report.published.push(id);
                    if let Some(listener) = &self.listener {
                        listener.on_published(&saved, PublishSource::Schedule).await;
                    }
                }
                Ok(None) => {
                    tracing::debug!(item_id = %id, "Due content no longer exists, skipped");
                    report.skipped.push(id);
                }
                Err(e) => {
                    tracing::error!(item_id = %id, code = e.code(), error = %e, "Failed to publish due content");
                    report.failed.push((id, e));
                }
            }
        }

        if !report.published.is_empty() {
            tracing::info!(
                count = report.published.len(),
                source = PublishSource::Schedule.as_str(),
                "Published due content"
            );
        }
        Ok(report)
    }

    async fn publish_one(
        &self,
        item: &ContentItem,
        now: DateTime<Utc>,
    ) -> Result<Option<ContentItem>, LifecycleError> {
        let mut next = lifecycle::apply_due_publication(item, now)?;
        next.updated_at = now;
        match self.repo.update(next).await {
            Ok(saved) => Ok(Some(saved)),
            Err(RepoError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl JobHandler for PublishDueJob {
    async fn run(&self, now: DateTime<Utc>) -> JobResult {
        match self.publish_due(now).await {
            Ok(report) if report.failed.is_empty() => JobResult::Completed {
                processed: report.published.len(),
            },
            Ok(report) => JobResult::failed(format!(
                "{} of {} due items failed to publish",
                report.failed.len(),
                report.failed.len() + report.published.len()
            )),
            Err(e) => JobResult::failed(e.to_string()),
        }
    }
}
