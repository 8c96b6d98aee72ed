//! Application configuration loaded from environment variables.

use std::env;

use chrono::TimeDelta;

use folio_core::domain::LifecyclePolicy;
use folio_infra::{DatabaseConfig, SchedulerConfig};

use crate::telemetry::TelemetryConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub scheduler: SchedulerConfig,
    pub policy: LifecyclePolicy,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let policy = env::var("SCHEDULE_GRACE_SECS")
            .ok()
            .and_then(|s| parse_schedule_grace(&s))
            .map(|schedule_grace| LifecyclePolicy { schedule_grace })
            .unwrap_or_default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
            policy,
            telemetry: TelemetryConfig::from_env(),
        }
    }
}

/// Non-negative whole seconds; anything else falls back to the default.
fn parse_schedule_grace(raw: &str) -> Option<TimeDelta> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|secs| *secs >= 0)
        .and_then(TimeDelta::try_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_grace_rejects_negative_and_garbage() {
        assert_eq!(parse_schedule_grace("600"), Some(TimeDelta::minutes(10)));
        assert_eq!(parse_schedule_grace("0"), Some(TimeDelta::zero()));
        assert_eq!(parse_schedule_grace("-60"), None);
        assert_eq!(parse_schedule_grace("soon"), None);
    }
}
