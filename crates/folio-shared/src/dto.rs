//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create a draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContentRequest {
    pub author_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Request to replace an item's title and body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditContentRequest {
    pub title: String,
    pub body: String,
}

/// Request to schedule a draft. `publish_at` is an RFC 3339 timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub publish_at: String,
}

/// Ids for a bulk trash operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkIdsRequest {
    pub ids: Vec<Uuid>,
}

/// A content item as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub status: String,
    pub publish_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub prior_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome for one id of a bulk operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub id: Uuid,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkResponse {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkItemResult>,
}

impl BulkResponse {
    pub fn new(results: Vec<BulkItemResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.ok).count();
        Self {
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}
