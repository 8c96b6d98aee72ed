//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::{ContentStatus, TransitionAction};

/// Lifecycle errors - every failure a content transition can report.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Cannot {action} content in {from} state")]
    InvalidTransition {
        from: ContentStatus,
        action: TransitionAction,
    },

    #[error("Invalid publish timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] RepoError),
}

impl LifecycleError {
    pub(crate) fn content_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity_type: "content",
            id,
        }
    }

    /// Stable machine-readable code, used in logs and bulk reports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::InvalidTimestamp(_) => "invalid_timestamp",
            Self::NotFound { .. } => "not_found",
            Self::PersistenceFailure(_) => "persistence_failure",
        }
    }
}

/// Scheduler errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Invalid cadence: {0}")]
    InvalidCadence(String),
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
