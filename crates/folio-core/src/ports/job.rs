//! Scheduled job port - the contract between job handlers and the runner.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::JobError;

/// How often a job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Fixed interval since the previous firing. A newly registered job is
    /// due on the first tick.
    Every(Duration),
    /// Once per day, on the first tick at or after `hour:minute` UTC.
    DailyAt { hour: u32, minute: u32 },
}

impl Cadence {
    pub fn every_secs(secs: u64) -> Self {
        Self::Every(Duration::from_secs(secs))
    }

    pub fn validate(&self) -> Result<(), JobError> {
        match *self {
            Self::Every(interval) if interval.is_zero() => Err(JobError::InvalidCadence(
                "interval must be positive".to_string(),
            )),
            Self::DailyAt { hour, minute } if hour >= 24 || minute >= 60 => Err(
                JobError::InvalidCadence(format!("{hour:02}:{minute:02} is not a time of day")),
            ),
            _ => Ok(()),
        }
    }

    /// First firing for a job registered at `registered_at`.
    pub fn first_fire(&self, registered_at: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Every(_) => registered_at,
            Self::DailyAt { .. } => self.next_fire_after(registered_at),
        }
    }

    /// Next firing strictly after a firing at `fired_at`.
    pub fn next_fire_after(&self, fired_at: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Self::Every(interval) => TimeDelta::from_std(interval)
                .ok()
                .and_then(|step| fired_at.checked_add_signed(step))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Self::DailyAt { hour, minute } => {
                let Some(slot) = NaiveTime::from_hms_opt(hour, minute, 0) else {
                    return fired_at + TimeDelta::days(1);
                };
                let today = fired_at.date_naive().and_time(slot).and_utc();
                if today > fired_at {
                    today
                } else {
                    today + TimeDelta::days(1)
                }
            }
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Every(interval) => write!(f, "every {}s", interval.as_secs()),
            Self::DailyAt { hour, minute } => write!(f, "daily at {hour:02}:{minute:02} UTC"),
        }
    }
}

/// Result of one handler invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobResult {
    /// Handler finished; `processed` counts the items it changed.
    Completed { processed: usize },
    /// Handler failed. Work it already committed stays committed; the next
    /// firing retries the whole invocation.
    Failed { reason: String },
}

impl JobResult {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// Unit of work behind a job id.
///
/// Handlers must be safe to re-run: the runner never retries individual items.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, now: DateTime<Utc>) -> JobResult;
}

/// A job as registered with the scheduler.
#[derive(Clone)]
pub struct JobDefinition {
    pub id: String,
    pub name: String,
    pub cadence: Cadence,
    /// `None` keeps the enabled flag of a job already registered under this
    /// id (new jobs start enabled).
    pub enabled: Option<bool>,
    pub handler: Arc<dyn JobHandler>,
}

impl JobDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        cadence: Cadence,
        handler: Arc<dyn JobHandler>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cadence,
            enabled: None,
            handler,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }
}

impl fmt::Debug for JobDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("cadence", &self.cadence)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
