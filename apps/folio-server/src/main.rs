//! # Folio Server
//!
//! Admin HTTP API for the content lifecycle, plus the in-process scheduler
//! that publishes due posts and purges expired trash.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    telemetry::init_telemetry(&config.telemetry);

    tracing::info!(
        host = %config.host,
        port = config.port,
        "Starting Folio server"
    );

    let state = AppState::new(&config).await;

    if let Err(e) = state.scheduler.register_default_jobs().await {
        tracing::error!(error = %e, "Failed to register scheduler jobs");
        return Err(std::io::Error::other(e));
    }
    state.scheduler.start().await;

    let scheduler = state.scheduler.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    let result = server.await;

    tracing::info!("HTTP server stopped, shutting down scheduler");
    scheduler.shutdown().await;

    result
}
