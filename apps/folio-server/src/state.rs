//! Application state - shared across all handlers.

use std::sync::Arc;

use folio_core::ports::{Clock, ContentRepository, SystemClock};
use folio_core::services::LifecycleService;
use folio_infra::{DatabaseConnections, InMemoryContentRepository, Scheduler};

#[cfg(feature = "postgres")]
use folio_infra::PostgresContentRepository;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<LifecycleService>,
    pub scheduler: Arc<Scheduler>,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let (db, repo) = Self::storage(config).await;

        let lifecycle = Arc::new(
            LifecycleService::new(repo.clone(), clock.clone()).with_policy(config.policy),
        );
        let scheduler = Arc::new(Scheduler::new(
            config.scheduler.clone(),
            clock,
            repo,
            lifecycle.clone(),
        ));

        tracing::info!(database = db.is_some(), "Application state initialized");

        Self {
            lifecycle,
            scheduler,
            db,
        }
    }

    /// State over an empty in-memory store, for handler tests.
    #[cfg(test)]
    pub fn in_memory(clock: Arc<dyn Clock>, config: folio_infra::SchedulerConfig) -> Self {
        let repo = in_memory_repo();
        let lifecycle = Arc::new(LifecycleService::new(repo.clone(), clock.clone()));
        let scheduler = Arc::new(Scheduler::new(config, clock, repo, lifecycle.clone()));
        Self {
            lifecycle,
            scheduler,
            db: None,
        }
    }

    #[cfg(feature = "postgres")]
    async fn storage(
        config: &AppConfig,
    ) -> (Option<Arc<DatabaseConnections>>, Arc<dyn ContentRepository>) {
        let Some(db_config) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return (None, in_memory_repo());
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => {
                let conn = Arc::new(connections);
                let repo: Arc<dyn ContentRepository> =
                    Arc::new(PostgresContentRepository::new(conn.main.clone()));
                (Some(conn), repo)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
                (None, in_memory_repo())
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn storage(
        _config: &AppConfig,
    ) -> (Option<Arc<DatabaseConnections>>, Arc<dyn ContentRepository>) {
        tracing::info!("Running without postgres feature - using in-memory repository");
        (None, in_memory_repo())
    }
}

fn in_memory_repo() -> Arc<dyn ContentRepository> {
    Arc::new(InMemoryContentRepository::new())
}
