//! Content item entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use folio_core::domain::{ContentItem, ContentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Status {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "published")]
    Published,
    #[sea_orm(string_value = "trashed")]
    Trashed,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "content_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub status: Status,
    pub publish_at: Option<DateTimeWithTimeZone>,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub prior_status: Option<Status>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Status> for ContentStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => Self::Draft,
            Status::Scheduled => Self::Scheduled,
            Status::Published => Self::Published,
            Status::Trashed => Self::Trashed,
        }
    }
}

impl From<ContentStatus> for Status {
    fn from(status: ContentStatus) -> Self {
        match status {
            ContentStatus::Draft => Self::Draft,
            ContentStatus::Scheduled => Self::Scheduled,
            ContentStatus::Published => Self::Published,
            ContentStatus::Trashed => Self::Trashed,
        }
    }
}

/// Conversion from SeaORM Model to domain ContentItem.
impl From<Model> for ContentItem {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            title: model.title,
            body: model.body,
            status: model.status.into(),
            publish_at: model.publish_at.map(Into::into),
            deleted_at: model.deleted_at.map(Into::into),
            prior_status: model.prior_status.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from domain ContentItem to SeaORM ActiveModel.
impl From<ContentItem> for ActiveModel {
    fn from(item: ContentItem) -> Self {
        Self {
            id: Set(item.id),
            author_id: Set(item.author_id),
            title: Set(item.title),
            body: Set(item.body),
            status: Set(item.status.into()),
            publish_at: Set(item.publish_at.map(Into::into)),
            deleted_at: Set(item.deleted_at.map(Into::into)),
            prior_status: Set(item.prior_status.map(Into::into)),
            created_at: Set(item.created_at.into()),
            updated_at: Set(item.updated_at.into()),
        }
    }
}
