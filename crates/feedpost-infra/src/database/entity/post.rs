//! Post entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::{NotSet, Set};

use feedpost_core::domain::{NewPost, Post};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique, nullable)]
    pub guid: Option<String>,
    pub title: String,
    pub link: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub pub_date: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            guid: model.guid,
            title: model.title,
            link: model.link,
            description: model.description,
            pub_date: model.pub_date.into(),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl ActiveModel {
    /// Row for a new post; the database assigns the id.
    pub fn for_insert(data: NewPost, now: DateTimeWithTimeZone) -> Self {
        Self {
            id: NotSet,
            guid: Set(Some(data.guid)),
            title: Set(data.content.title),
            link: Set(data.content.link),
            description: Set(data.content.description),
            pub_date: Set(data.content.pub_date.into()),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}
