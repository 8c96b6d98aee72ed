//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod clock;
mod job;
mod listener;
mod repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use job::{Cadence, JobDefinition, JobHandler, JobResult};
pub use listener::PublicationListener;
pub use repository::{BaseRepository, ContentRepository};
