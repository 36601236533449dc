//! The garden: one tile per calendar day, grown by the posts of that day.
//!
//! Tiles are rebuilt in full from a post list and a date window. A day with
//! posts is grass whose height follows the post count; a day without posts is
//! bare soil, or, purely for decoration, water.

use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Post;
use crate::kst::{self, KST_OFFSET_MINUTES};

/// Chance that an empty day is drawn as water instead of soil.
pub const WATER_PROBABILITY: f64 = 0.15;

/// Growth stage of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TileKind {
    Soil,
    Water,
    GrassShort,
    GrassMedium,
    GrassTall,
}

impl TileKind {
    /// Grass stage for a day with `count` posts, `None` for an empty day.
    pub fn for_post_count(count: usize) -> Option<TileKind> {
        match count {
            0 => None,
            1 => Some(TileKind::GrassShort),
            2 => Some(TileKind::GrassMedium),
            _ => Some(TileKind::GrassTall),
        }
    }

    pub fn is_grass(self) -> bool {
        matches!(
            self,
            TileKind::GrassShort | TileKind::GrassMedium | TileKind::GrassTall
        )
    }

    /// Number of grass blades drawn on the tile.
    pub fn blade_count(self) -> u8 {
        match self {
            TileKind::GrassShort => 3,
            TileKind::GrassMedium => 5,
            TileKind::GrassTall => 8,
            TileKind::Soil | TileKind::Water => 0,
        }
    }
}

/// One calendar day of the garden.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    pub index: usize,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TileKind,
    /// Posts of the day, oldest first.
    pub posts: Vec<Post>,
}

impl Tile {
    pub fn has_posts(&self) -> bool {
        !self.posts.is_empty()
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GardenError {
    #[error("invalid garden range: start {start} is after today {today}")]
    InvalidRange { start: NaiveDate, today: NaiveDate },
}

/// Inclusive range of days shown by the garden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GardenWindow {
    pub start: NaiveDate,
    pub today: NaiveDate,
    pub offset_minutes: i32,
}

impl GardenWindow {
    /// Window in KST.
    pub fn new(start: NaiveDate, today: NaiveDate) -> Self {
        Self {
            start,
            today,
            offset_minutes: KST_OFFSET_MINUTES,
        }
    }

    /// Window from a fixed start up to today's date in the given offset.
    pub fn ending_today(start: NaiveDate, offset_minutes: i32) -> Self {
        let offset_minutes = kst::clamp_offset_minutes(offset_minutes);
        Self {
            start,
            today: kst::offset_today(offset_minutes),
            offset_minutes,
        }
    }

    pub fn with_offset(mut self, offset_minutes: i32) -> Self {
        self.offset_minutes = kst::clamp_offset_minutes(offset_minutes);
        self
    }

    /// Inclusive day count; fails when `today` precedes `start`.
    pub fn day_count(&self) -> Result<usize, GardenError> {
        let days = (self.today - self.start).num_days();
        if days < 0 {
            return Err(GardenError::InvalidRange {
                start: self.start,
                today: self.today,
            });
        }
        Ok(days as usize + 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.today
    }

    /// First instant covered by the window.
    pub fn range_start(&self) -> DateTime<Utc> {
        kst::day_start(self.start, self.offset_minutes)
    }

    /// First instant after the window.
    pub fn range_end(&self) -> DateTime<Utc> {
        let next = self
            .today
            .checked_add_days(Days::new(1))
            .unwrap_or(self.today);
        kst::day_start(next, self.offset_minutes)
    }
}

/// Source of the decorative soil/water choice for empty days.
pub trait Decoration: Send {
    fn is_water(&mut self) -> bool;
}

/// Never draws water; for callers that need a fully deterministic grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDecoration;

impl Decoration for NoDecoration {
    fn is_water(&mut self) -> bool {
        false
    }
}

/// Draws water with a fixed probability from an injected RNG.
#[derive(Debug, Clone)]
pub struct RandomWater<R> {
    rng: R,
    probability: f64,
}

impl<R: Rng + Send> RandomWater<R> {
    pub fn new(rng: R) -> Self {
        Self::with_probability(rng, WATER_PROBABILITY)
    }

    pub fn with_probability(rng: R, probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self { rng, probability }
    }
}

impl RandomWater<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> Decoration for RandomWater<R> {
    fn is_water(&mut self) -> bool {
        self.rng.gen_bool(self.probability)
    }
}

/// Build the tile grid for `window` from `posts`.
///
/// Posts are bucketed by their calendar day in the window's offset; posts
/// falling outside the window are dropped. The decoration source is consulted
/// only for days without posts, so grass never depends on it.
pub fn build_tiles<D>(
    posts: &[Post],
    window: &GardenWindow,
    decoration: &mut D,
) -> Result<Vec<Tile>, GardenError>
where
    D: Decoration + ?Sized,
{
    let day_count = window.day_count()?;

    let mut buckets: HashMap<NaiveDate, Vec<Post>> = HashMap::new();
    let mut dropped = 0usize;
    for post in posts {
        let day = kst::offset_date(post.published_at, window.offset_minutes);
        if !window.contains(day) {
            dropped += 1;
            continue;
        }
        buckets.entry(day).or_default().push(post.clone());
    }
    if dropped > 0 {
        tracing::debug!(dropped, start = %window.start, today = %window.today, "Posts outside the garden window");
    }

    let mut tiles = Vec::with_capacity(day_count);
    for index in 0..day_count {
        let Some(date) = window.start.checked_add_days(Days::new(index as u64)) else {
            break;
        };

        let mut day_posts = buckets.remove(&date).unwrap_or_default();
        day_posts.sort_by(|a, b| {
            a.published_at
                .cmp(&b.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let kind = match TileKind::for_post_count(day_posts.len()) {
            Some(grass) => grass,
            None if decoration.is_water() => TileKind::Water,
            None => TileKind::Soil,
        };

        tiles.push(Tile {
            index,
            date,
            kind,
            posts: day_posts,
        });
    }

    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, NewPost};
    use chrono::{TimeDelta, TimeZone};
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn post_at(title: &str, at: DateTime<Utc>) -> Post {
        Post::published_at(
            Uuid::new_v4(),
            NewPost {
                title: title.to_string(),
                content: String::new(),
                category: Category::Daily,
                thumbnail_url: None,
            },
            at,
        )
    }

    /// Always answers water, to prove decoration never overrides grass.
    struct AlwaysWater;

    impl Decoration for AlwaysWater {
        fn is_water(&mut self) -> bool {
            true
        }
    }

    #[test]
    fn test_only_posts_past_offset_midnight_move_to_next_day() {
        let window = GardenWindow::new(day(2025, 11, 2), day(2025, 11, 4));
        // 19:00 and 08:30 next day in +09:00.
        let a = post_at("a", Utc.with_ymd_and_hms(2025, 11, 2, 10, 0, 0).unwrap());
        let b = post_at("b", Utc.with_ymd_and_hms(2025, 11, 2, 23, 30, 0).unwrap());

        let tiles = build_tiles(&[b.clone(), a.clone()], &window, &mut NoDecoration).unwrap();

        assert_eq!(tiles.len(), 3);
        assert_eq!(tiles[0].date, day(2025, 11, 2));
        assert_eq!(tiles[0].kind, TileKind::GrassShort);
        assert_eq!(tiles[0].posts, vec![a]);

        assert_eq!(tiles[1].date, day(2025, 11, 3));
        assert_eq!(tiles[1].kind, TileKind::GrassShort);
        assert_eq!(tiles[1].posts, vec![b]);

        assert_eq!(tiles[2].date, day(2025, 11, 4));
        assert!(tiles[2].posts.is_empty());
    }

    #[test]
    fn test_posts_past_offset_midnight_share_next_day() {
        let window = GardenWindow::new(day(2025, 11, 2), day(2025, 11, 4));
        // 00:30 and 08:30 on 11-03 in +09:00.
        let a = post_at("a", Utc.with_ymd_and_hms(2025, 11, 2, 15, 30, 0).unwrap());
        let b = post_at("b", Utc.with_ymd_and_hms(2025, 11, 2, 23, 30, 0).unwrap());

        let tiles = build_tiles(&[b.clone(), a.clone()], &window, &mut NoDecoration).unwrap();

        assert!(tiles[0].posts.is_empty());
        assert_eq!(tiles[1].date, day(2025, 11, 3));
        assert_eq!(tiles[1].kind, TileKind::GrassMedium);
        // Oldest first regardless of input order.
        assert_eq!(tiles[1].posts, vec![a, b]);
        assert!(tiles[2].posts.is_empty());
    }

    #[test]
    fn test_tile_count_and_ordering() {
        let start = day(2025, 11, 1);
        for span in [0u64, 1, 29, 365] {
            let today = start.checked_add_days(Days::new(span)).unwrap();
            let window = GardenWindow::new(start, today);
            let tiles = build_tiles(&[], &window, &mut NoDecoration).unwrap();

            assert_eq!(tiles.len() as u64, span + 1);
            for (i, tile) in tiles.iter().enumerate() {
                assert_eq!(tile.index, i);
                assert_eq!(tile.date, start.checked_add_days(Days::new(i as u64)).unwrap());
            }
            assert_eq!(tiles.last().unwrap().date, today);
        }
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let window = GardenWindow::new(day(2025, 11, 5), day(2025, 11, 4));
        let err = build_tiles(&[], &window, &mut NoDecoration).unwrap_err();
        assert_eq!(
            err,
            GardenError::InvalidRange {
                start: day(2025, 11, 5),
                today: day(2025, 11, 4)
            }
        );
    }

    #[test]
    fn test_growth_stage_follows_post_count() {
        let window = GardenWindow::new(day(2025, 11, 1), day(2025, 11, 11));
        let base = kst::day_start(day(2025, 11, 1), KST_OFFSET_MINUTES);

        // Day i gets exactly i posts.
        let mut posts = Vec::new();
        for i in 0..=10i64 {
            for n in 0..i {
                let at = base + TimeDelta::days(i) + TimeDelta::minutes(n * 7);
                posts.push(post_at(&format!("{i}-{n}"), at));
            }
        }

        let tiles = build_tiles(&posts, &window, &mut AlwaysWater).unwrap();
        for tile in &tiles {
            let expected = match tile.index {
                0 => TileKind::Water,
                1 => TileKind::GrassShort,
                2 => TileKind::GrassMedium,
                _ => TileKind::GrassTall,
            };
            assert_eq!(tile.post_count(), tile.index);
            assert_eq!(tile.kind, expected, "tile {}", tile.index);
        }
    }

    #[test]
    fn test_posts_outside_window_are_dropped() {
        let window = GardenWindow::new(day(2025, 11, 2), day(2025, 11, 3));
        let inside = post_at("in", Utc.with_ymd_and_hms(2025, 11, 2, 0, 0, 0).unwrap());
        // 2025-11-01 23:00 KST
        let before = post_at("before", Utc.with_ymd_and_hms(2025, 11, 1, 14, 0, 0).unwrap());
        // 2025-11-04 00:00 KST
        let after = post_at("after", Utc.with_ymd_and_hms(2025, 11, 3, 15, 0, 0).unwrap());

        let tiles = build_tiles(&[before, inside.clone(), after], &window, &mut NoDecoration).unwrap();

        let placed: Vec<&Post> = tiles.iter().flat_map(|t| t.posts.iter()).collect();
        assert_eq!(placed, vec![&inside]);
        assert_eq!(tiles[0].kind, TileKind::GrassShort);
    }

    #[test]
    fn test_every_in_range_post_lands_once_on_its_key() {
        let window = GardenWindow::new(day(2025, 11, 1), day(2025, 11, 30));
        let base = Utc.with_ymd_and_hms(2025, 10, 31, 15, 0, 0).unwrap();
        let posts: Vec<Post> = (0..200i64)
            .map(|n| post_at(&n.to_string(), base + TimeDelta::minutes(n * 230)))
            .collect();

        let tiles = build_tiles(&posts, &window, &mut NoDecoration).unwrap();

        for post in &posts {
            let key = kst::to_offset_date_key(post.published_at, KST_OFFSET_MINUTES);
            let hits: Vec<&Tile> = tiles
                .iter()
                .filter(|t| t.posts.iter().any(|p| p.id == post.id))
                .collect();
            let in_range = window.contains(kst::offset_date(post.published_at, KST_OFFSET_MINUTES));
            if in_range {
                assert_eq!(hits.len(), 1);
                assert_eq!(kst::date_key(hits[0].date), key);
            } else {
                assert!(hits.is_empty());
            }
        }
    }

    #[test]
    fn test_rebuild_is_idempotent_except_for_empty_decoration() {
        let window = GardenWindow::new(day(2025, 11, 1), day(2025, 11, 20));
        let base = Utc.with_ymd_and_hms(2025, 11, 1, 3, 0, 0).unwrap();
        let posts: Vec<Post> = (0..15i64)
            .map(|n| post_at(&n.to_string(), base + TimeDelta::hours(n * 17)))
            .collect();

        let first = build_tiles(&posts, &window, &mut RandomWater::seeded(1)).unwrap();
        let second = build_tiles(&posts, &window, &mut RandomWater::seeded(99)).unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.date, b.date);
            assert_eq!(a.posts, b.posts);
            if a.has_posts() {
                assert_eq!(a.kind, b.kind);
            } else {
                assert!(matches!(a.kind, TileKind::Soil | TileKind::Water));
                assert!(matches!(b.kind, TileKind::Soil | TileKind::Water));
            }
        }
    }

    #[test]
    fn test_same_seed_reproduces_decoration() {
        let window = GardenWindow::new(day(2025, 1, 1), day(2025, 12, 31));
        let first = build_tiles(&[], &window, &mut RandomWater::seeded(7)).unwrap();
        let second = build_tiles(&[], &window, &mut RandomWater::seeded(7)).unwrap();
        assert_eq!(first, second);

        let water = first.iter().filter(|t| t.kind == TileKind::Water).count();
        // 365 draws at 15%: comfortably inside these bounds.
        assert!(water > 20 && water < 100, "water tiles: {water}");
    }

    #[test]
    fn test_zero_probability_never_waters() {
        let window = GardenWindow::new(day(2025, 1, 1), day(2025, 3, 1));
        let mut decoration = RandomWater::with_probability(StdRng::seed_from_u64(3), 0.0);
        let tiles = build_tiles(&[], &window, &mut decoration).unwrap();
        assert!(tiles.iter().all(|t| t.kind == TileKind::Soil));
    }

    #[test]
    fn test_window_range_bounds_follow_offset() {
        let window = GardenWindow::new(day(2025, 11, 2), day(2025, 11, 4));
        assert_eq!(
            window.range_start(),
            Utc.with_ymd_and_hms(2025, 11, 1, 15, 0, 0).unwrap()
        );
        assert_eq!(
            window.range_end(),
            Utc.with_ymd_and_hms(2025, 11, 4, 15, 0, 0).unwrap()
        );
        assert_eq!(window.day_count().unwrap(), 3);
    }

    #[test]
    fn test_window_reports_the_offset_it_buckets_in() {
        let window = GardenWindow::new(day(2025, 11, 2), day(2025, 11, 4)).with_offset(10_000);
        assert_eq!(window.offset_minutes, 24 * 60 - 1);
        assert_eq!(
            GardenWindow::ending_today(day(2025, 11, 2), -10_000).offset_minutes,
            -(24 * 60 - 1)
        );
    }

    #[test]
    fn test_tile_kind_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&TileKind::GrassMedium).unwrap(),
            "\"grass-medium\""
        );
        assert_eq!(TileKind::GrassTall.blade_count(), 8);
        assert!(!TileKind::Water.is_grass());
    }
}
