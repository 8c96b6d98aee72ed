//! In-memory content repository - used when no database is configured.
//!
//! Rejects rows that break the lifecycle invariants the same way a CHECK
//! constraint would. Note: data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use folio_core::domain::{ContentItem, ContentStatus};
use folio_core::error::RepoError;
use folio_core::ports::{BaseRepository, ContentRepository};

/// In-memory content store using a HashMap behind an async RwLock.
pub struct InMemoryContentRepository {
    store: RwLock<HashMap<Uuid, ContentItem>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

impl Default for InMemoryContentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<ContentItem, Uuid> for InMemoryContentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn save(&self, item: ContentItem) -> Result<ContentItem, RepoError> {
        item.check_invariants()
            .map_err(|e| RepoError::Constraint(e.to_string()))?;

        let mut store = self.store.write().await;
        store.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update(&self, item: ContentItem) -> Result<ContentItem, RepoError> {
        item.check_invariants()
            .map_err(|e| RepoError::Constraint(e.to_string()))?;

        let mut store = self.store.write().await;
        let slot = store.get_mut(&item.id).ok_or(RepoError::NotFound)?;
        *slot = item.clone();
        Ok(item)
    }

    async fn remove(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.store.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn find_scheduled_due_before(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentItem>, RepoError> {
        let store = self.store.read().await;
        let mut due: Vec<ContentItem> = store
            .values()
            .filter(|item| {
                item.status == ContentStatus::Scheduled
                    && item.publish_at.is_some_and(|at| at <= now)
            })
            .cloned()
            .collect();

        due.sort_by_key(|item| (item.publish_at, item.created_at));
        Ok(due)
    }

    async fn find_trashed(
        &self,
        deleted_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<ContentItem>, RepoError> {
        let store = self.store.read().await;
        let mut trashed: Vec<ContentItem> = store
            .values()
            .filter(|item| item.is_trashed())
            .filter(|item| match deleted_before {
                Some(cutoff) => item.deleted_at.is_some_and(|at| at <= cutoff),
                None => true,
            })
            .cloned()
            .collect();

        trashed.sort_by_key(|item| (item.deleted_at, item.created_at));
        Ok(trashed)
    }
}
