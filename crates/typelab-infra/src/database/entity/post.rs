//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use typelab_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub category: String,
    pub thumbnail_url: Option<String>,
    pub published_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Rows with an unknown category are rejected here, at the boundary.
impl TryFrom<Model> for typelab_core::domain::Post {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let category = model.category.parse().map_err(|_| {
            RepoError::Corrupt(format!(
                "post {} has unknown category '{}'",
                model.id, model.category
            ))
        })?;

        Ok(Self {
            id: model.id,
            author_id: model.author_id,
            title: model.title,
            content: model.content,
            category,
            thumbnail_url: model.thumbnail_url,
            published_at: model.published_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<typelab_core::domain::Post> for ActiveModel {
    fn from(post: typelab_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            author_id: Set(post.author_id),
            title: Set(post.title),
            content: Set(post.content),
            category: Set(post.category.as_str().to_string()),
            thumbnail_url: Set(post.thumbnail_url),
            published_at: Set(post.published_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
