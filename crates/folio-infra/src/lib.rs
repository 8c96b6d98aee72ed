//! # Folio Infrastructure
//!
//! Concrete implementations of the ports defined in `folio-core`: content
//! storage and the job scheduler that drives the lifecycle jobs.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory storage only
//! - `postgres` - PostgreSQL content storage via SeaORM

pub mod database;
pub mod jobs;

pub use database::{DatabaseConfig, DatabaseConnections, InMemoryContentRepository};
pub use jobs::{JobRegistry, JobRunner, JobStatus, RunNowOutcome, RunNowReason, Scheduler, SchedulerConfig};

#[cfg(feature = "postgres")]
pub use database::PostgresContentRepository;
