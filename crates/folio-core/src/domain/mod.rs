//! Domain entities and the content lifecycle rules.

mod content;
pub mod lifecycle;

pub use content::{ContentItem, ContentStatus, InvariantViolation, UnknownStatus};
pub use lifecycle::{LifecyclePolicy, PublishSource, TransitionAction};
