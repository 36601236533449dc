//! Post handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use typelab_core::authors::{self, AuthorDirectory};
use typelab_core::domain::{Category, NewPost, Post, PostFilter, PostUpdate};
use typelab_core::error::DomainError;
use typelab_shared::dto::{CreatePostRequest, PostListQuery, PostResponse, UpdatePostRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Author names for `posts`; a failed lookup leaves every name anonymous.
async fn author_names(state: &AppState, posts: &[Post]) -> AuthorDirectory {
    authors::resolve_authors(state.profiles.as_ref(), posts)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Author lookup failed, showing fallback names");
            AuthorDirectory::default()
        })
}

async fn respond_with(state: &AppState, post: Post) -> PostResponse {
    let authors = author_names(state, std::slice::from_ref(&post)).await;
    PostResponse::from_post(post, &authors)
}

async fn find_post(state: &AppState, id: Uuid) -> AppResult<Post> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| {
            DomainError::NotFound {
                entity_type: "Post",
                id,
            }
            .into()
        })
}

/// Fetch `id` and check that `identity` wrote it.
async fn find_own_post(state: &AppState, identity: &Identity, id: Uuid) -> AppResult<Post> {
    let post = find_post(state, id).await?;
    if !post.is_authored_by(identity.user_id) {
        return Err(DomainError::Forbidden("only the author can change this post".to_string()).into());
    }
    Ok(post)
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let draft = NewPost::from(body.into_inner());
    draft.validate()?;

    let post = state.posts.save(Post::new(identity.user_id, draft)).await?;
    tracing::info!(post_id = %post.id, author_id = %post.author_id, category = %post.category, "Post published");

    Ok(HttpResponse::Created().json(respond_with(&state, post).await))
}

/// GET /api/posts?userId=&category=
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let filter = PostFilter {
        author_id: query.user_id,
        category: Category::parse_filter(query.category.as_deref())?,
        ..PostFilter::default()
    };

    let posts = state.posts.list(filter).await?;
    let authors = author_names(&state, &posts).await;

    let body: Vec<PostResponse> = posts
        .into_iter()
        .map(|post| PostResponse::from_post(post, &authors))
        .collect();

    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/posts/{id}
pub async fn get_post(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(respond_with(&state, post).await))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let update = PostUpdate::from(body.into_inner());
    update.validate()?;

    let mut post = find_own_post(&state, &identity, path.into_inner()).await?;
    post.apply(update);
    let post = state.posts.save(post).await?;

    Ok(HttpResponse::Ok().json(respond_with(&state, post).await))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_own_post(&state, &identity, path.into_inner()).await?;
    state.posts.delete(post.id).await?;
    tracing::info!(post_id = %post.id, "Post deleted");

    Ok(HttpResponse::NoContent().finish())
}
