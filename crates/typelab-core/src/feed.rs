//! Loading garden snapshots from the stores.
//!
//! `load_garden` fetches the window's posts, builds the tiles and resolves
//! author names. `GardenFeed` wraps it for long-lived views: each load takes a
//! generation ticket and only the newest ticket may publish its result.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::authors::{self, AuthorDirectory};
use crate::domain::{Category, PostFilter};
use crate::error::RepoError;
use crate::garden::{self, Decoration, GardenWindow, Tile};
use crate::ports::{PostRepository, ProfileRepository};

/// What to show: a date window and an optional category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GardenQuery {
    pub window: GardenWindow,
    pub category: Option<Category>,
}

impl GardenQuery {
    pub fn new(window: GardenWindow) -> Self {
        Self {
            window,
            category: None,
        }
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    fn post_filter(&self) -> PostFilter {
        PostFilter {
            category: self.category,
            published_after: Some(self.window.range_start()),
            published_before: Some(self.window.range_end()),
            ..PostFilter::default()
        }
    }
}

/// Tiles and author names computed for one query. Replaced wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct GardenSnapshot {
    pub window: GardenWindow,
    pub category: Option<Category>,
    pub tiles: Vec<Tile>,
    pub authors: AuthorDirectory,
}

/// Fetch, bucket and name the posts for `query`.
///
/// A misconfigured window renders an empty grid instead of failing. Author
/// lookup failures leave every name on the anonymous fallback. Only the post
/// fetch itself can fail the load.
pub async fn load_garden(
    posts: &dyn PostRepository,
    profiles: &dyn ProfileRepository,
    query: &GardenQuery,
    decoration: &mut dyn Decoration,
) -> Result<GardenSnapshot, RepoError> {
    let empty = |query: &GardenQuery| GardenSnapshot {
        window: query.window,
        category: query.category,
        tiles: Vec::new(),
        authors: AuthorDirectory::default(),
    };

    if let Err(e) = query.window.day_count() {
        tracing::error!(error = %e, "Garden window misconfigured, rendering empty grid");
        return Ok(empty(query));
    }

    let listed = posts.list(query.post_filter()).await?;

    let tiles = match garden::build_tiles(&listed, &query.window, decoration) {
        Ok(tiles) => tiles,
        Err(e) => {
            tracing::error!(error = %e, "Garden build failed, rendering empty grid");
            return Ok(empty(query));
        }
    };

    let authors = match authors::resolve_authors(profiles, &listed).await {
        Ok(authors) => authors,
        Err(e) => {
            tracing::warn!(error = %e, "Author lookup failed, showing fallback names");
            AuthorDirectory::default()
        }
    };

    Ok(GardenSnapshot {
        window: query.window,
        category: query.category,
        tiles,
        authors,
    })
}

/// Progress of the most recent load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    /// The store could not be reached; the previous snapshot is kept.
    Failed(String),
}

/// What happened to one call to [`GardenFeed::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load started before this one finished; its result was dropped.
    Superseded,
    Failed,
}

struct FeedInner {
    generation: u64,
    state: LoadState,
    snapshot: Option<Arc<GardenSnapshot>>,
}

/// Holds the latest garden snapshot for a view whose query can change.
pub struct GardenFeed {
    posts: Arc<dyn PostRepository>,
    profiles: Arc<dyn ProfileRepository>,
    inner: RwLock<FeedInner>,
}

impl GardenFeed {
    pub fn new(posts: Arc<dyn PostRepository>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self {
            posts,
            profiles,
            inner: RwLock::new(FeedInner {
                generation: 0,
                state: LoadState::Idle,
                snapshot: None,
            }),
        }
    }

    /// Load `query`; last request wins.
    pub async fn load(&self, query: GardenQuery, decoration: &mut dyn Decoration) -> LoadOutcome {
        let ticket = {
            let mut inner = self.inner.write().await;
            inner.generation += 1;
            inner.state = LoadState::Loading;
            inner.generation
        };

        let result = load_garden(
            self.posts.as_ref(),
            self.profiles.as_ref(),
            &query,
            decoration,
        )
        .await;

        let mut inner = self.inner.write().await;
        if inner.generation != ticket {
            tracing::debug!(
                ticket,
                current = inner.generation,
                "Discarding superseded garden load"
            );
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(snapshot) => {
                inner.snapshot = Some(Arc::new(snapshot));
                inner.state = LoadState::Ready;
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(error = %e, "Garden load failed");
                inner.state = LoadState::Failed(e.to_string());
                LoadOutcome::Failed
            }
        }
    }

    pub async fn snapshot(&self) -> Option<Arc<GardenSnapshot>> {
        self.inner.read().await.snapshot.clone()
    }

    pub async fn state(&self) -> LoadState {
        self.inner.read().await.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewPost, Post, Profile};
    use crate::garden::{NoDecoration, TileKind};
    use crate::ports::BaseRepository;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    /// Post store whose latency depends on the requested category.
    struct SlowPosts {
        posts: Vec<Post>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl BaseRepository<Post, Uuid> for SlowPosts {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
            Ok(self.posts.iter().find(|p| p.id == id).cloned())
        }

        async fn save(&self, entity: Post) -> Result<Post, RepoError> {
            Ok(entity)
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[async_trait]
    impl PostRepository for SlowPosts {
        async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, RepoError> {
            let delay = match filter.category {
                Some(Category::Info) => 50,
                _ => 10,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(RepoError::Connection("store unreachable".to_string()));
            }
            Ok(self.posts.iter().filter(|p| filter.matches(p)).cloned().collect())
        }
    }

    struct Names(Vec<Profile>);

    #[async_trait]
    impl BaseRepository<Profile, Uuid> for Names {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
            Ok(self.0.iter().find(|p| p.id == id).cloned())
        }

        async fn save(&self, entity: Profile) -> Result<Profile, RepoError> {
            Ok(entity)
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[async_trait]
    impl ProfileRepository for Names {
        async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, RepoError> {
            Ok(self.0.iter().filter(|p| ids.contains(&p.id)).cloned().collect())
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    fn fixture() -> (Arc<SlowPosts>, Arc<Names>, Uuid) {
        let author = Uuid::new_v4();
        let mk = |title: &str, category, hour| {
            Post::published_at(
                author,
                NewPost {
                    title: title.to_string(),
                    category,
                    ..NewPost::default()
                },
                Utc.with_ymd_and_hms(2025, 11, 2, hour, 0, 0).unwrap(),
            )
        };
        let posts = SlowPosts {
            posts: vec![
                mk("info", Category::Info, 1),
                mk("daily one", Category::Daily, 2),
                mk("daily two", Category::Daily, 3),
            ],
            fail: AtomicBool::new(false),
        };
        let names = Names(vec![Profile::new(author, "Kim").unwrap()]);
        (Arc::new(posts), Arc::new(names), author)
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_garden_builds_tiles_and_names() {
        let (posts, names, author) = fixture();
        let query = GardenQuery::new(GardenWindow::new(day(1), day(4)))
            .with_category(Some(Category::Daily));

        let snapshot = load_garden(posts.as_ref(), names.as_ref(), &query, &mut NoDecoration)
            .await
            .unwrap();

        assert_eq!(snapshot.tiles.len(), 4);
        assert_eq!(snapshot.tiles[1].kind, TileKind::GrassMedium);
        assert_eq!(snapshot.authors.display_name(author), "Kim");
    }

    #[tokio::test(start_paused = true)]
    async fn test_inverted_window_renders_empty_grid() {
        let (posts, names, _) = fixture();
        let query = GardenQuery::new(GardenWindow::new(day(5), day(4)));

        let snapshot = load_garden(posts.as_ref(), names.as_ref(), &query, &mut NoDecoration)
            .await
            .unwrap();

        assert!(snapshot.tiles.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_load_is_discarded() {
        let (posts, names, _) = fixture();
        let feed = GardenFeed::new(posts, names);
        let window = GardenWindow::new(day(1), day(4));

        let slow = GardenQuery::new(window).with_category(Some(Category::Info));
        let fast = GardenQuery::new(window).with_category(Some(Category::Daily));

        let mut first = NoDecoration;
        let mut second = NoDecoration;
        let (slow_outcome, fast_outcome) =
            tokio::join!(feed.load(slow, &mut first), feed.load(fast, &mut second));

        assert_eq!(slow_outcome, LoadOutcome::Superseded);
        assert_eq!(fast_outcome, LoadOutcome::Applied);

        let snapshot = feed.snapshot().await.unwrap();
        assert_eq!(snapshot.category, Some(Category::Daily));
        assert_eq!(feed.state().await, LoadState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_snapshot() {
        let (posts, names, _) = fixture();
        let feed = GardenFeed::new(posts.clone(), names);
        let query = GardenQuery::new(GardenWindow::new(day(1), day(4)));

        assert_eq!(feed.state().await, LoadState::Idle);
        assert_eq!(feed.load(query, &mut NoDecoration).await, LoadOutcome::Applied);

        posts.fail.store(true, Ordering::SeqCst);
        assert_eq!(feed.load(query, &mut NoDecoration).await, LoadOutcome::Failed);

        assert!(matches!(feed.state().await, LoadState::Failed(_)));
        let kept = feed.snapshot().await.unwrap();
        assert_eq!(kept.tiles.len(), 4);
    }
}
