//! Lifecycle service - user-initiated transitions and the trash subsystem.
//!
//! Every operation is a single-item round-trip: load, apply the pure
//! transition from [`crate::domain::lifecycle`], save. Bulk operations run the
//! single-item operation per id and report each outcome separately.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::lifecycle;
use crate::domain::{ContentItem, ContentStatus, LifecyclePolicy, PublishSource};
use crate::error::{LifecycleError, RepoError};
use crate::ports::{Clock, ContentRepository, PublicationListener};

/// Per-id result of a bulk operation.
#[derive(Debug)]
pub struct BulkOutcome {
    pub id: Uuid,
    pub result: Result<(), LifecycleError>,
}

impl BulkOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Entry point for every user-driven lifecycle change.
pub struct LifecycleService {
    repo: Arc<dyn ContentRepository>,
    clock: Arc<dyn Clock>,
    policy: LifecyclePolicy,
    listener: Option<Arc<dyn PublicationListener>>,
}

impl LifecycleService {
    pub fn new(repo: Arc<dyn ContentRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            policy: LifecyclePolicy::default(),
            listener: None,
        }
    }

    pub fn with_policy(mut self, policy: LifecyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn PublicationListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Fetch an item by id.
    pub async fn get(&self, id: Uuid) -> Result<ContentItem, LifecycleError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| LifecycleError::content_not_found(id))
    }

    /// Store a new draft.
    pub async fn create_draft(
        &self,
        author_id: Uuid,
        title: String,
        body: String,
    ) -> Result<ContentItem, LifecycleError> {
        let item = ContentItem::new_draft(author_id, title, body, self.clock.now());
        let saved = self.repo.save(item).await?;

        tracing::info!(item_id = %saved.id, author_id = %author_id, "Draft created");
        Ok(saved)
    }

    async fn persist(
        &self,
        mut item: ContentItem,
        now: DateTime<Utc>,
    ) -> Result<ContentItem, LifecycleError> {
        item.updated_at = now;
        let id = item.id;
        self.repo.update(item).await.map_err(|e| match e {
            RepoError::NotFound => LifecycleError::content_not_found(id),
            other => other.into(),
        })
    }

    /// `draft -> scheduled`.
    pub async fn schedule(
        &self,
        id: Uuid,
        publish_at: DateTime<Utc>,
    ) -> Result<ContentItem, LifecycleError> {
        let now = self.clock.now();
        let item = self.get(id).await?;
        let next = lifecycle::request_schedule(&item, publish_at, now, &self.policy)?;
        let saved = self.persist(next, now).await?;

        tracing::info!(
            item_id = %id,
            publish_at = %publish_at.to_rfc3339(),
            due_now = lifecycle::is_due(&saved, now),
            "Content scheduled"
        );
        Ok(saved)
    }

    /// `scheduled -> draft`.
    pub async fn unschedule(&self, id: Uuid) -> Result<ContentItem, LifecycleError> {
        let now = self.clock.now();
        let item = self.get(id).await?;
        let next = lifecycle::unschedule(&item)?;
        let saved = self.persist(next, now).await?;

        tracing::info!(item_id = %id, "Content unscheduled");
        Ok(saved)
    }

    /// Publish immediately. Already published items are returned unchanged.
    pub async fn publish_now(&self, id: Uuid) -> Result<ContentItem, LifecycleError> {
        let now = self.clock.now();
        let item = self.get(id).await?;
        if item.status == ContentStatus::Published {
            return Ok(item);
        }

        let next = lifecycle::publish_now(&item, now)?;
        let saved = self.persist(next, now).await?;

        tracing::info!(
            item_id = %id,
            source = PublishSource::Manual.as_str(),
            "Content published"
        );
        if let Some(listener) = &self.listener {
            listener.on_published(&saved, PublishSource::Manual).await;
        }
        Ok(saved)
    }

    /// Content-only edit; never changes status or publish time.
    pub async fn edit(
        &self,
        id: Uuid,
        title: String,
        body: String,
    ) -> Result<ContentItem, LifecycleError> {
        let now = self.clock.now();
        let item = self.get(id).await?;
        let next = lifecycle::edit(&item, title, body, now)?;
        self.persist(next, now).await
    }

    /// Soft delete.
    pub async fn trash(&self, id: Uuid) -> Result<ContentItem, LifecycleError> {
        let now = self.clock.now();
        let item = self.get(id).await?;
        let next = lifecycle::trash(&item, now)?;
        let saved = self.persist(next, now).await?;

        tracing::info!(item_id = %id, prior_status = %item.status, "Content moved to trash");
        Ok(saved)
    }

    /// Bring a trashed item back to the status it had before.
    pub async fn restore(&self, id: Uuid) -> Result<ContentItem, LifecycleError> {
        let now = self.clock.now();
        let item = self.get(id).await?;
        let next = lifecycle::restore(&item)?;
        let saved = self.persist(next, now).await?;

        tracing::info!(
            item_id = %id,
            status = %saved.status,
            due_now = lifecycle::is_due(&saved, now),
            "Content restored from trash"
        );
        Ok(saved)
    }

    /// Permanently delete a trashed item.
    pub async fn purge(&self, id: Uuid) -> Result<(), LifecycleError> {
        let item = self.get(id).await?;
        lifecycle::purge(&item)?;

        // Someone else got there first.
        if !self.repo.remove(id).await? {
            return Err(LifecycleError::content_not_found(id));
        }

        tracing::info!(item_id = %id, "Content permanently deleted");
        Ok(())
    }

    pub async fn bulk_restore(&self, ids: &[Uuid]) -> Vec<BulkOutcome> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            let result = self.restore(id).await.map(|_| ());
            outcomes.push(BulkOutcome { id, result });
        }
        log_bulk("restore", &outcomes);
        outcomes
    }

    pub async fn bulk_purge(&self, ids: &[Uuid]) -> Vec<BulkOutcome> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            outcomes.push(BulkOutcome {
                id,
                result: self.purge(id).await,
            });
        }
        log_bulk("purge", &outcomes);
        outcomes
    }

    /// Permanently delete everything currently in the trash.
    pub async fn empty_trash(&self) -> Result<Vec<BulkOutcome>, LifecycleError> {
        let ids = self.trashed_ids(None).await?;
        Ok(self.bulk_purge(&ids).await)
    }

    /// Permanently delete items trashed at or before `cutoff`.
    pub async fn purge_expired(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<BulkOutcome>, LifecycleError> {
        let ids = self.trashed_ids(Some(cutoff)).await?;
        Ok(self.bulk_purge(&ids).await)
    }

    async fn trashed_ids(
        &self,
        deleted_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Uuid>, LifecycleError> {
        let trashed = self.repo.find_trashed(deleted_before).await?;
        Ok(trashed.into_iter().map(|item| item.id).collect())
    }
}

fn log_bulk(operation: &'static str, outcomes: &[BulkOutcome]) {
    for outcome in outcomes {
        if let Err(e) = &outcome.result {
            tracing::warn!(
                operation,
                item_id = %outcome.id,
                code = e.code(),
                error = %e,
                "Bulk item failed"
            );
        }
    }

    let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
    if !outcomes.is_empty() {
        tracing::info!(
            operation,
            requested = outcomes.len(),
            succeeded,
            "Bulk operation finished"
        );
    }
}
