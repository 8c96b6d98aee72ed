use std::time::Duration;

use chrono::TimeDelta;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Enable the ticker. Manual runs work either way.
    pub enabled: bool,
    pub tick_interval: Duration,
    /// Cadence of the publish-due job.
    pub publish_interval: Duration,
    /// How long trashed items are kept; `None` disables the purge job.
    pub trash_retention: Option<TimeDelta>,
    /// UTC hour at which expired trash is purged.
    pub trash_purge_hour: u32,
    /// How long shutdown waits for running jobs.
    pub shutdown_grace: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval: Duration::from_millis(1000),
            publish_interval: Duration::from_secs(60),
            trash_retention: Some(TimeDelta::days(30)),
            trash_purge_hour: 3,
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let retention_days: i64 = env_parse("TRASH_RETENTION_DAYS").unwrap_or(30);

        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            tick_interval: env_parse::<u64>("SCHEDULER_TICK_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            publish_interval: env_parse("PUBLISH_DUE_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.publish_interval),
            trash_retention: Some(retention_days)
                .filter(|d| *d > 0)
                .and_then(TimeDelta::try_days),
            trash_purge_hour: env_parse::<u32>("TRASH_PURGE_HOUR")
                .filter(|h| *h < 24)
                .unwrap_or(defaults.trash_purge_hour),
            shutdown_grace: env_parse("SCHEDULER_SHUTDOWN_GRACE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_grace),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
