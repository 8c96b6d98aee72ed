//! Content lifecycle and trash handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use folio_core::domain::{ContentItem, lifecycle};
use folio_core::services::BulkOutcome;
use folio_shared::ApiResponse;
use folio_shared::dto::{
    BulkIdsRequest, BulkItemResult, BulkResponse, ContentResponse, CreateContentRequest,
    EditContentRequest, ScheduleRequest,
};

use crate::middleware::error::AppResult;
use crate::state::AppState;

fn content_response(item: ContentItem) -> ContentResponse {
    ContentResponse {
        id: item.id,
        author_id: item.author_id,
        title: item.title,
        body: item.body,
        status: item.status.to_string(),
        publish_at: item.publish_at,
        deleted_at: item.deleted_at,
        prior_status: item.prior_status.map(|s| s.to_string()),
        created_at: item.created_at,
        updated_at: item.updated_at,
    }
}

fn bulk_response(outcomes: Vec<BulkOutcome>) -> BulkResponse {
    let results = outcomes
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(()) => BulkItemResult {
                id: outcome.id,
                ok: true,
                code: None,
                error: None,
            },
            Err(e) => BulkItemResult {
                id: outcome.id,
                ok: false,
                code: Some(e.code().to_string()),
                error: Some(e.to_string()),
            },
        })
        .collect();
    BulkResponse::new(results)
}

fn ok(item: ContentItem) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(content_response(item)))
}

/// POST /api/content
pub async fn create(
    state: web::Data<AppState>,
    body: web::Json<CreateContentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let item = state
        .lifecycle
        .create_draft(req.author_id, req.title, req.body)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(content_response(item))))
}

/// GET /api/content/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    Ok(ok(state.lifecycle.get(path.into_inner()).await?))
}

/// PUT /api/content/{id}
pub async fn edit(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<EditContentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    Ok(ok(state
        .lifecycle
        .edit(path.into_inner(), req.title, req.body)
        .await?))
}

/// POST /api/content/{id}/schedule
pub async fn schedule(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ScheduleRequest>,
) -> AppResult<HttpResponse> {
    let publish_at = lifecycle::parse_publish_at(&body.publish_at)?;
    Ok(ok(state.lifecycle.schedule(path.into_inner(), publish_at).await?))
}

/// POST /api/content/{id}/unschedule
pub async fn unschedule(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    Ok(ok(state.lifecycle.unschedule(path.into_inner()).await?))
}

/// POST /api/content/{id}/publish
pub async fn publish(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    Ok(ok(state.lifecycle.publish_now(path.into_inner()).await?))
}

/// POST /api/content/{id}/trash
pub async fn trash(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    Ok(ok(state.lifecycle.trash(path.into_inner()).await?))
}

/// POST /api/content/{id}/restore
pub async fn restore(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    Ok(ok(state.lifecycle.restore(path.into_inner()).await?))
}

/// DELETE /api/content/{id}
///
/// Only trashed items can be purged.
pub async fn purge(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    state.lifecycle.purge(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/trash/restore
pub async fn bulk_restore(
    state: web::Data<AppState>,
    body: web::Json<BulkIdsRequest>,
) -> HttpResponse {
    let outcomes = state.lifecycle.bulk_restore(&body.ids).await;
    HttpResponse::Ok().json(ApiResponse::ok(bulk_response(outcomes)))
}

/// POST /api/trash/purge
pub async fn bulk_purge(
    state: web::Data<AppState>,
    body: web::Json<BulkIdsRequest>,
) -> HttpResponse {
    let outcomes = state.lifecycle.bulk_purge(&body.ids).await;
    HttpResponse::Ok().json(ApiResponse::ok(bulk_response(outcomes)))
}

/// DELETE /api/trash
pub async fn empty_trash(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let outcomes = state.lifecycle.empty_trash().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(bulk_response(outcomes))))
}
