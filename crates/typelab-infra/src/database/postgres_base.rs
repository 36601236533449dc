use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DbConn, DbErr, EntityTrait, IntoActiveModel,
    PrimaryKeyTrait,
};
use uuid::Uuid;

use typelab_core::domain::{Post, Profile, User};
use typelab_core::error::RepoError;
use typelab_core::ports::BaseRepository;

/// Domain values addressed by a UUID primary key.
pub trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for Post {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Profile {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for User {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// Generic PostgreSQL repository implementation.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: DbConn,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

pub(crate) fn query_error(e: DbErr) -> RepoError {
    match e {
        DbErr::Conn(inner) => RepoError::Connection(inner.to_string()),
        DbErr::ConnectionAcquire(inner) => RepoError::Connection(inner.to_string()),
        other => {
            let msg = other.to_string();
            if msg.contains("duplicate") || msg.contains("unique") {
                RepoError::Constraint(msg)
            } else {
                RepoError::Query(msg)
            }
        }
    }
}

#[async_trait]
impl<E, T> BaseRepository<T, Uuid> for PostgresBaseRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync + Send,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + Sync,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = Uuid>,
    T: Keyed + TryFrom<E::Model, Error = RepoError> + Into<E::ActiveModel> + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let result = E::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_error)?;

        result.map(T::try_from).transpose()
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        let exists = E::find_by_id(entity.key())
            .one(&self.db)
            .await
            .map_err(query_error)?
            .is_some();

        let active_model: E::ActiveModel = entity.into();
        let model = if exists {
            active_model.update(&self.db).await
        } else {
            active_model.insert(&self.db).await
        }
        .map_err(query_error)?;

        T::try_from(model)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = E::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(query_error)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
