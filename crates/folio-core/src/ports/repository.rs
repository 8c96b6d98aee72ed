use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ContentItem;
use crate::error::RepoError;

/// Generic repository trait defining the persistence round-trips the core needs.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Never inserts: a missing row is
    /// `RepoError::NotFound`.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Remove an entity by its ID. Returns `false` if nothing was removed.
    async fn remove(&self, id: ID) -> Result<bool, RepoError>;
}

/// Content storage contract.
///
/// Concurrent writers to the same row resolve last-write-wins; the core does
/// no version checking of its own.
#[async_trait]
pub trait ContentRepository: BaseRepository<ContentItem, Uuid> {
    /// Scheduled items whose `publish_at` is at or before `now`, oldest first.
    async fn find_scheduled_due_before(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentItem>, RepoError>;

    /// Trashed items, optionally only those deleted at or before `deleted_before`.
    async fn find_trashed(
        &self,
        deleted_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<ContentItem>, RepoError>;
}
