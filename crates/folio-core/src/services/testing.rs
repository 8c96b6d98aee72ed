//! Test doubles for the service layer.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ContentItem, ContentStatus, PublishSource};
use crate::error::RepoError;
use crate::ports::{BaseRepository, ContentRepository, PublicationListener};

/// HashMap-backed repository that can be told to fail writes for given ids.
#[derive(Default)]
pub struct FakeRepository {
    items: Mutex<HashMap<Uuid, ContentItem>>,
    failing: Mutex<HashSet<Uuid>>,
}

impl FakeRepository {
    pub fn insert(&self, item: ContentItem) {
        self.items.lock().unwrap().insert(item.id, item);
    }

    pub fn get(&self, id: Uuid) -> Option<ContentItem> {
        self.items.lock().unwrap().get(&id).cloned()
    }

    pub fn fail_writes_for(&self, id: Uuid) {
        self.failing.lock().unwrap().insert(id);
    }

    fn check_writable(&self, id: Uuid) -> Result<(), RepoError> {
        if self.failing.lock().unwrap().contains(&id) {
            return Err(RepoError::Connection("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<ContentItem, Uuid> for FakeRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem>, RepoError> {
        Ok(self.get(id))
    }

    async fn save(&self, item: ContentItem) -> Result<ContentItem, RepoError> {
        self.check_writable(item.id)?;
        self.insert(item.clone());
        Ok(item)
    }

    async fn update(&self, item: ContentItem) -> Result<ContentItem, RepoError> {
        self.check_writable(item.id)?;
        let mut items = self.items.lock().unwrap();
        let slot = items.get_mut(&item.id).ok_or(RepoError::NotFound)?;
        *slot = item.clone();
        Ok(item)
    }

    async fn remove(&self, id: Uuid) -> Result<bool, RepoError> {
        self.check_writable(id)?;
        Ok(self.items.lock().unwrap().remove(&id).is_some())
    }
}

#[async_trait]
impl ContentRepository for FakeRepository {
    async fn find_scheduled_due_before(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentItem>, RepoError> {
        let mut due: Vec<_> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.status == ContentStatus::Scheduled && i.publish_at.is_some_and(|at| at <= now))
            .cloned()
            .collect();
        due.sort_by_key(|i| (i.publish_at, i.created_at));
        Ok(due)
    }

    async fn find_trashed(
        &self,
        deleted_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<ContentItem>, RepoError> {
        let mut trashed: Vec<_> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.is_trashed())
            .filter(|i| match (deleted_before, i.deleted_at) {
                (Some(cutoff), Some(at)) => at <= cutoff,
                (None, _) => true,
                (Some(_), None) => false,
            })
            .cloned()
            .collect();
        trashed.sort_by_key(|i| i.created_at);
        Ok(trashed)
    }
}

/// Records every publication it hears about.
#[derive(Default)]
pub struct RecordingListener {
    pub events: Mutex<Vec<(Uuid, PublishSource)>>,
}

#[async_trait]
impl PublicationListener for RecordingListener {
    async fn on_published(&self, item: &ContentItem, source: PublishSource) {
        self.events.lock().unwrap().push((item.id, source));
    }
}
