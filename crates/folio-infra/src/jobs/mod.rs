//! Job scheduling: registry, single-flight runner and the ticking scheduler.

mod config;
mod registry;
mod runner;
mod scheduler;

pub use config::SchedulerConfig;
pub use registry::{DueJob, JobRegistry, JobStatus};
pub use runner::{Dispatched, JobRunner};
pub use scheduler::{RunNowOutcome, RunNowReason, Scheduler};
