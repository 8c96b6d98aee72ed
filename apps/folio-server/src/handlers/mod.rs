//! HTTP handlers and route configuration.

mod content;
mod health;
mod jobs;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/jobs")
                    .route("", web::get().to(jobs::list_jobs))
                    .route("/{id}/run", web::post().to(jobs::run_job))
                    .route("/{id}/enable", web::post().to(jobs::enable_job))
                    .route("/{id}/disable", web::post().to(jobs::disable_job)),
            )
            .service(
                web::scope("/content")
                    .route("", web::post().to(content::create))
                    .route("/{id}", web::get().to(content::get))
                    .route("/{id}", web::put().to(content::edit))
                    .route("/{id}", web::delete().to(content::purge))
                    .route("/{id}/schedule", web::post().to(content::schedule))
                    .route("/{id}/unschedule", web::post().to(content::unschedule))
                    .route("/{id}/publish", web::post().to(content::publish))
                    .route("/{id}/trash", web::post().to(content::trash))
                    .route("/{id}/restore", web::post().to(content::restore)),
            )
            .service(
                web::scope("/trash")
                    .route("", web::delete().to(content::empty_trash))
                    .route("/restore", web::post().to(content::bulk_restore))
                    .route("/purge", web::post().to(content::bulk_purge)),
            ),
    );
}
