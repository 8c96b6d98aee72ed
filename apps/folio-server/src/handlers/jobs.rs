//! Scheduler administration handlers.

use actix_web::{HttpResponse, web};

use folio_infra::RunNowReason;
use folio_shared::ApiResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::observability::RequestId;
use crate::state::AppState;

/// GET /api/jobs
pub async fn list_jobs(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(state.scheduler.get_status().await))
}

/// POST /api/jobs/{id}/run
///
/// Waits for the run to finish. A busy job answers `executed: false`.
pub async fn run_job(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request_id: RequestId,
) -> AppResult<HttpResponse> {
    let job_id = path.into_inner();
    tracing::info!(job_id = %job_id, request_id = %request_id.as_str(), "Manual job run requested");

    let outcome = state.scheduler.run_now(&job_id).await;
    if outcome.reason == Some(RunNowReason::NotFound) {
        return Err(AppError::NotFound(format!("Job not found: {job_id}")));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(outcome)))
}

/// POST /api/jobs/{id}/enable
pub async fn enable_job(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.scheduler.enable(&path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/jobs/{id}/disable
pub async fn disable_job(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.scheduler.disable(&path).await?;
    Ok(HttpResponse::NoContent().finish())
}
