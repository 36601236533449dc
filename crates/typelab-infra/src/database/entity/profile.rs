//! Profile entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use typelab_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub display_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::Id",
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

impl TryFrom<Model> for typelab_core::domain::Profile {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            display_name: model.display_name,
        })
    }
}

impl From<typelab_core::domain::Profile> for ActiveModel {
    fn from(profile: typelab_core::domain::Profile) -> Self {
        Self {
            id: Set(profile.id),
            display_name: Set(profile.display_name),
        }
    }
}
