//! Publication listener port - downstream consumers of publish events
//! (notifications, email digests, cache warmers).

use async_trait::async_trait;

use crate::domain::{ContentItem, PublishSource};

/// Notified after a publication has been persisted.
///
/// Listeners cannot veto or fail a publication; anything they need to retry
/// is theirs to track.
#[async_trait]
pub trait PublicationListener: Send + Sync {
    async fn on_published(&self, item: &ContentItem, source: PublishSource);
}
