use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Where a content item sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Scheduled,
    Published,
    Trashed,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
            Self::Trashed => "trashed",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown content status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ContentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "published" => Ok(Self::Published),
            "trashed" => Ok(Self::Trashed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Content item entity - a post, page or any other publishable document.
///
/// The lifecycle fields (`status`, `publish_at`, `deleted_at`, `prior_status`)
/// are only ever changed through [`crate::domain::lifecycle`]; everything else
/// is authoring payload carried along untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub status: ContentStatus,
    /// Requested instant while scheduled, actual publish instant once published.
    pub publish_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Status the item had when it was trashed; consumed by restore.
    pub prior_status: Option<ContentStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Create a new draft.
    pub fn new_draft(author_id: Uuid, title: String, body: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            body,
            status: ContentStatus::Draft,
            publish_at: None,
            deleted_at: None,
            prior_status: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_trashed(&self) -> bool {
        self.status == ContentStatus::Trashed
    }

    /// Check the lifecycle invariants, returning the first one violated.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        match self.status {
            ContentStatus::Draft => {
                if self.publish_at.is_some() {
                    return Err(InvariantViolation::DraftWithPublishAt);
                }
                self.check_not_in_trash()
            }
            ContentStatus::Scheduled => {
                if self.publish_at.is_none() {
                    return Err(InvariantViolation::MissingPublishAt(self.status));
                }
                self.check_not_in_trash()
            }
            ContentStatus::Published => {
                if self.publish_at.is_none() {
                    return Err(InvariantViolation::MissingPublishAt(self.status));
                }
                self.check_not_in_trash()
            }
            ContentStatus::Trashed => {
                if self.deleted_at.is_none() {
                    return Err(InvariantViolation::TrashedWithoutDeletedAt);
                }
                match self.prior_status {
                    None | Some(ContentStatus::Trashed) => {
                        Err(InvariantViolation::InvalidPriorStatus(self.prior_status))
                    }
                    // The retained publish_at must be restorable as-is.
                    Some(ContentStatus::Draft) if self.publish_at.is_some() => {
                        Err(InvariantViolation::DraftWithPublishAt)
                    }
                    Some(prior @ (ContentStatus::Scheduled | ContentStatus::Published))
                        if self.publish_at.is_none() =>
                    {
                        Err(InvariantViolation::MissingPublishAt(prior))
                    }
                    Some(_) => Ok(()),
                }
            }
        }
    }

    fn check_not_in_trash(&self) -> Result<(), InvariantViolation> {
        if self.deleted_at.is_some() || self.prior_status.is_some() {
            return Err(InvariantViolation::TrashFieldsOutsideTrash(self.status));
        }
        Ok(())
    }
}

/// A broken lifecycle invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{0} item has no publish_at")]
    MissingPublishAt(ContentStatus),

    #[error("draft item carries a publish_at")]
    DraftWithPublishAt,

    #[error("{0} item carries deleted_at or prior_status")]
    TrashFieldsOutsideTrash(ContentStatus),

    #[error("trashed item has no deleted_at")]
    TrashedWithoutDeletedAt,

    #[error("trashed item has invalid prior status {0:?}")]
    InvalidPriorStatus(Option<ContentStatus>),
}
