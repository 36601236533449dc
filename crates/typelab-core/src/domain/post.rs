use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Post category. Every post belongs to exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Info,
    #[default]
    Document,
    Daily,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Info, Category::Document, Category::Daily];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Info => "info",
            Category::Document => "document",
            Category::Daily => "daily",
        }
    }

    /// Label shown on category badges and filter buttons.
    pub fn label(self) -> &'static str {
        match self {
            Category::Info => "정보",
            Category::Document => "문서",
            Category::Daily => "일상",
        }
    }

    /// Parse a list filter value, where `all` (or nothing) means no filter.
    pub fn parse_filter(value: Option<&str>) -> Result<Option<Category>, DomainError> {
        match value.map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(other) => other.parse().map(Some),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Category::Info),
            "document" => Ok(Category::Document),
            "daily" => Ok(Category::Daily),
            other => Err(DomainError::Validation(format!(
                "unknown category '{other}'"
            ))),
        }
    }
}

/// Post entity - a published rich-text entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    /// Rich-text markup produced by the editor; stored verbatim.
    pub content: String,
    pub category: Category,
    pub thumbnail_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Publish a new post now.
    pub fn new(author_id: Uuid, draft: NewPost) -> Self {
        Self::published_at(author_id, draft, Utc::now())
    }

    pub fn published_at(author_id: Uuid, draft: NewPost, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: draft.title.trim().to_string(),
            content: draft.content,
            category: draft.category,
            thumbnail_url: draft.thumbnail_url,
            published_at: at,
            updated_at: at,
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    /// Apply an edit. The publish time never moves.
    pub fn apply(&mut self, update: PostUpdate) {
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(thumbnail_url) = update.thumbnail_url {
            self.thumbnail_url = thumbnail_url;
        }
        self.updated_at = Utc::now();
    }
}

/// Fields supplied by an author when publishing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub thumbnail_url: Option<String>,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_title(&self.title)
    }
}

/// Partial edit of an existing post. `thumbnail_url: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Category>,
    pub thumbnail_url: Option<Option<String>>,
}

impl PostUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        match &self.title {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::Validation("title must not be empty".to_string()));
    }
    Ok(())
}

/// Query over the post store. Results are always newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub author_id: Option<Uuid>,
    pub category: Option<Category>,
    /// Inclusive lower bound on `published_at`.
    pub published_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `published_at`.
    pub published_before: Option<DateTime<Utc>>,
}

impl PostFilter {
    pub fn by_author(author_id: Uuid) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.author_id.is_none_or(|id| post.author_id == id)
            && self.category.is_none_or(|c| post.category == c)
            && self.published_after.is_none_or(|t| post.published_at >= t)
            && self.published_before.is_none_or(|t| post.published_at < t)
    }
}
