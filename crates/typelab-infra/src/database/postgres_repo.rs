//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use typelab_core::domain::{Post, PostFilter, Profile, User};
use typelab_core::error::RepoError;
use typelab_core::ports::{PostRepository, ProfileRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::profile::{self, Entity as ProfileEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL profile repository.
pub type PostgresProfileRepository = PostgresBaseRepository<ProfileEntity>;

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        result.map(User::try_from).transpose()
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, RepoError> {
        let mut query = PostEntity::find();
        if let Some(author_id) = filter.author_id {
            query = query.filter(post::Column::AuthorId.eq(author_id));
        }
        if let Some(category) = filter.category {
            query = query.filter(post::Column::Category.eq(category.as_str()));
        }
        if let Some(after) = filter.published_after {
            query = query.filter(post::Column::PublishedAt.gte(after));
        }
        if let Some(before) = filter.published_before {
            query = query.filter(post::Column::PublishedAt.lt(before));
        }

        let rows = query
            .order_by_desc(post::Column::PublishedAt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        // One bad row must not hide every other post.
        Ok(rows
            .into_iter()
            .filter_map(|row| match Post::try_from(row) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed post row");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = ProfileEntity::find()
            .filter(profile::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(query_error)?;

        rows.into_iter().map(Profile::try_from).collect()
    }
}
