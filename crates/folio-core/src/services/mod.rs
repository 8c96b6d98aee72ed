//! Application services written against the ports: the lifecycle service
//! (user-driven transitions and the trash subsystem) and the scheduled job
//! handlers.

mod lifecycle;
mod publish_due;
mod purge_trash;

#[cfg(test)]
pub(crate) mod testing;

pub use lifecycle::{BulkOutcome, LifecycleService};
pub use publish_due::{PUBLISH_DUE_JOB_ID, PublishDueJob, PublishDueReport};
pub use purge_trash::{PURGE_EXPIRED_TRASH_JOB_ID, PurgeExpiredTrashJob};
