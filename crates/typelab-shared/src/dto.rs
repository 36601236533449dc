//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use typelab_core::authors::AuthorDirectory;
use typelab_core::domain::{Category, NewPost, Post, PostUpdate, Profile};
use typelab_core::feed::GardenSnapshot;
use typelab_core::garden::{Tile, TileKind};
use typelab_core::kst;

/// Request to create an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Request to sign in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// The signed-in user and their profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

/// Body of `POST /api/posts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl From<CreatePostRequest> for NewPost {
    fn from(req: CreatePostRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            category: req.category,
            thumbnail_url: req.thumbnail_url,
        }
    }
}

/// Body of `PUT /api/posts/{id}`. Absent fields are left unchanged;
/// `"thumbnail_url": null` removes the thumbnail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub thumbnail_url: Option<Option<String>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl From<UpdatePostRequest> for PostUpdate {
    fn from(req: UpdatePostRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            category: req.category,
            thumbnail_url: req.thumbnail_url,
        }
    }
}

/// Query string of `GET /api/posts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<Uuid>,
    pub category: Option<String>,
}

/// Query string of `GET /api/garden`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GardenParams {
    pub category: Option<String>,
}

/// A post with its author's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub category_label: String,
    pub thumbnail_url: Option<String>,
    pub published_at: DateTime<Utc>,
    /// Publish day in the site's fixed offset, `YYYY-MM-DD`.
    pub published_on: String,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    pub fn from_post(post: Post, authors: &AuthorDirectory) -> Self {
        Self {
            author_name: authors.display_name(post.author_id).to_string(),
            category_label: post.category.label().to_string(),
            published_on: kst::to_offset_date_key(post.published_at, kst::KST_OFFSET_MINUTES),
            id: post.id,
            author_id: post.author_id,
            title: post.title,
            content: post.content,
            category: post.category,
            thumbnail_url: post.thumbnail_url,
            published_at: post.published_at,
            updated_at: post.updated_at,
        }
    }
}

/// A post as listed on a garden tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TilePostResponse {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub category: Category,
    pub published_at: DateTime<Utc>,
}

/// One day of the garden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileResponse {
    pub index: usize,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TileKind,
    pub blade_count: u8,
    pub posts: Vec<TilePostResponse>,
}

impl TileResponse {
    fn from_tile(tile: &Tile, authors: &AuthorDirectory) -> Self {
        Self {
            index: tile.index,
            date: tile.date,
            kind: tile.kind,
            blade_count: tile.kind.blade_count(),
            posts: tile
                .posts
                .iter()
                .map(|post| TilePostResponse {
                    id: post.id,
                    title: post.title.clone(),
                    author_id: post.author_id,
                    author_name: authors.display_name(post.author_id).to_string(),
                    category: post.category,
                    published_at: post.published_at,
                })
                .collect(),
        }
    }
}

/// Body of `GET /api/garden`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GardenResponse {
    pub start_date: NaiveDate,
    pub today: NaiveDate,
    pub offset_minutes: i32,
    pub category: Option<Category>,
    pub tiles: Vec<TileResponse>,
}

impl From<&GardenSnapshot> for GardenResponse {
    fn from(snapshot: &GardenSnapshot) -> Self {
        Self {
            start_date: snapshot.window.start,
            today: snapshot.window.today,
            offset_minutes: snapshot.window.offset_minutes,
            category: snapshot.category,
            tiles: snapshot
                .tiles
                .iter()
                .map(|tile| TileResponse::from_tile(tile, &snapshot.authors))
                .collect(),
        }
    }
}

/// Query string of `GET /api/profiles`: comma-separated ids.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileIdsQuery {
    #[serde(default)]
    pub ids: String,
}

impl ProfileIdsQuery {
    /// Parse the id list, reporting the first malformed entry.
    pub fn parse_ids(&self) -> Result<Vec<Uuid>, String> {
        self.ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Uuid::parse_str(s).map_err(|_| format!("invalid profile id '{s}'")))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub display_name: String,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: String,
}

/// Query string of `POST /api/uploads/thumbnails`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadParams {
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub path: String,
    pub public_url: String,
}
