//! PostgreSQL content repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use folio_core::domain::ContentItem;
use folio_core::error::RepoError;
use folio_core::ports::{BaseRepository, ContentRepository};

use super::entity::content_item::{self, Column, Entity as ContentEntity, Status};

/// PostgreSQL content repository.
pub struct PostgresContentRepository {
    db: DbConn,
}

impl PostgresContentRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

fn query_error(e: DbErr) -> RepoError {
    let err_str = e.to_string();
    if err_str.contains("duplicate") || err_str.contains("unique") {
        RepoError::Constraint(err_str)
    } else {
        RepoError::Query(err_str)
    }
}

#[async_trait]
impl BaseRepository<ContentItem, Uuid> for PostgresContentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem>, RepoError> {
        let result = ContentEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, item: ContentItem) -> Result<ContentItem, RepoError> {
        let active_model: content_item::ActiveModel = item.clone().into();

        // Upsert, used for new drafts only; transitions go through `update`.
        ContentEntity::insert(active_model)
            .on_conflict(
                OnConflict::column(Column::Id)
                    .update_columns([
                        Column::AuthorId,
                        Column::Title,
                        Column::Body,
                        Column::Status,
                        Column::PublishAt,
                        Column::DeletedAt,
                        Column::PriorStatus,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(query_error)?;

        Ok(item)
    }

    async fn update(&self, item: ContentItem) -> Result<ContentItem, RepoError> {
        let active_model: content_item::ActiveModel = item.clone().into();

        let result = ContentEntity::update_many()
            .set(active_model)
            .filter(Column::Id.eq(item.id))
            .exec(&self.db)
            .await
            .map_err(query_error)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(item)
    }

    async fn remove(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = ContentEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl ContentRepository for PostgresContentRepository {
    async fn find_scheduled_due_before(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentItem>, RepoError> {
        let result = ContentEntity::find()
            .filter(Column::Status.eq(Status::Scheduled))
            .filter(Column::PublishAt.lte(now))
            .order_by_asc(Column::PublishAt)
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_trashed(
        &self,
        deleted_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<ContentItem>, RepoError> {
        let mut query = ContentEntity::find().filter(Column::Status.eq(Status::Trashed));
        if let Some(cutoff) = deleted_before {
            query = query.filter(Column::DeletedAt.lte(cutoff));
        }

        let result = query
            .order_by_asc(Column::DeletedAt)
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
