//! Author name resolution for visible posts.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Post, Profile};
use crate::error::RepoError;
use crate::ports::ProfileRepository;

/// Shown for authors whose profile is missing or not yet resolved.
pub const ANONYMOUS_LABEL: &str = "anonymous";

/// Mapping from author id to display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuthorDirectory {
    names: HashMap<Uuid, String>,
}

impl AuthorDirectory {
    pub fn from_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        Self {
            names: profiles
                .into_iter()
                .map(|profile| (profile.id, profile.display_name))
                .collect(),
        }
    }

    /// Display name for `author_id`, or the anonymous label.
    pub fn display_name(&self, author_id: Uuid) -> &str {
        self.names
            .get(&author_id)
            .map(String::as_str)
            .unwrap_or(ANONYMOUS_LABEL)
    }

    pub fn is_resolved(&self, author_id: Uuid) -> bool {
        self.names.contains_key(&author_id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Distinct author ids of `posts`, in a stable order.
pub fn distinct_author_ids<'a>(posts: impl IntoIterator<Item = &'a Post>) -> Vec<Uuid> {
    posts
        .into_iter()
        .map(|post| post.author_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Resolve display names for every author of `posts` with one batch lookup.
pub async fn resolve_authors(
    profiles: &dyn ProfileRepository,
    posts: &[Post],
) -> Result<AuthorDirectory, RepoError> {
    let ids = distinct_author_ids(posts);
    if ids.is_empty() {
        return Ok(AuthorDirectory::default());
    }

    let found = profiles.find_by_ids(&ids).await?;
    tracing::debug!(requested = ids.len(), resolved = found.len(), "Resolved author names");

    Ok(AuthorDirectory::from_profiles(found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, NewPost};
    use crate::ports::BaseRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProfiles {
        profiles: Vec<Profile>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BaseRepository<Profile, Uuid> for FixedProfiles {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
            Ok(self.profiles.iter().find(|p| p.id == id).cloned())
        }

        async fn save(&self, entity: Profile) -> Result<Profile, RepoError> {
            Ok(entity)
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[async_trait]
    impl ProfileRepository for FixedProfiles {
        async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, RepoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .profiles
                .iter()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect())
        }
    }

    fn post_by(author_id: Uuid) -> Post {
        Post::new(
            author_id,
            NewPost {
                title: "t".to_string(),
                category: Category::Daily,
                ..NewPost::default()
            },
        )
    }

    #[tokio::test]
    async fn test_missing_profile_falls_back_to_anonymous() {
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();
        let repo = FixedProfiles {
            profiles: vec![Profile::new(u1, "Kim").unwrap()],
            calls: AtomicUsize::new(0),
        };

        let authors = resolve_authors(&repo, &[post_by(u1), post_by(u2), post_by(u1)])
            .await
            .unwrap();

        assert_eq!(authors.display_name(u1), "Kim");
        assert_eq!(authors.display_name(u2), ANONYMOUS_LABEL);
        assert!(!authors.is_resolved(u2));
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_posts_skips_lookup() {
        let repo = FixedProfiles {
            profiles: Vec::new(),
            calls: AtomicUsize::new(0),
        };
        let authors = resolve_authors(&repo, &[]).await.unwrap();
        assert!(authors.is_empty());
        assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_distinct_ids_are_deduplicated() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let posts = [post_by(a), post_by(b), post_by(a)];
        let ids = distinct_author_ids(&posts);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a) && ids.contains(&b));
    }

    #[test]
    fn test_unresolved_directory_reads_anonymous() {
        assert_eq!(
            AuthorDirectory::default().display_name(Uuid::new_v4()),
            ANONYMOUS_LABEL
        );
    }
}
