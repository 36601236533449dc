//! Hover, selection and open-post state for the garden.
//!
//! One state at a time: an open post always wins over hover and selection,
//! and a tile without posts never becomes hovered or selected.

use uuid::Uuid;

use crate::garden::Tile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractionState {
    #[default]
    Idle,
    Hovering(usize),
    Selected(usize),
    PostOpen(Uuid),
}

/// Owns the interaction state and applies the allowed transitions.
#[derive(Debug, Clone, Default)]
pub struct TileInteraction {
    state: InteractionState,
}

impl TileInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Pointer entered `tile`. Only idle or hovering states follow the pointer.
    pub fn hover(&mut self, tile: &Tile) {
        if !tile.has_posts() {
            return;
        }
        if let InteractionState::Idle | InteractionState::Hovering(_) = self.state {
            self.state = InteractionState::Hovering(tile.index);
        }
    }

    /// Pointer left whatever tile it was on.
    pub fn unhover(&mut self) {
        if let InteractionState::Hovering(_) = self.state {
            self.state = InteractionState::Idle;
        }
    }

    /// Click on `tile`. Clicking the selected tile again deselects it.
    pub fn click_tile(&mut self, tile: &Tile) {
        if !tile.has_posts() {
            return;
        }
        self.state = match self.state {
            InteractionState::PostOpen(id) => InteractionState::PostOpen(id),
            InteractionState::Selected(index) if index == tile.index => InteractionState::Idle,
            _ => InteractionState::Selected(tile.index),
        };
    }

    /// Click that landed on no tile. Ignored while a post is open.
    pub fn click_outside(&mut self) {
        if let InteractionState::PostOpen(_) = self.state {
            return;
        }
        self.state = InteractionState::Idle;
    }

    pub fn select_post(&mut self, post_id: Uuid) {
        self.state = InteractionState::PostOpen(post_id);
    }

    /// Close the open post, or clear everything on navigation away.
    pub fn close(&mut self) {
        self.state = InteractionState::Idle;
    }

    /// Index of the tile currently hovered or selected.
    pub fn focused_tile(&self) -> Option<usize> {
        match self.state {
            InteractionState::Hovering(index) | InteractionState::Selected(index) => Some(index),
            _ => None,
        }
    }

    /// Titles to show in the strip above the garden.
    ///
    /// An open post shows only its own title; a hovered or selected tile
    /// shows every post of that day, oldest first.
    pub fn title_strip<'a>(&self, tiles: &'a [Tile]) -> Vec<&'a str> {
        match self.state {
            InteractionState::Idle => Vec::new(),
            InteractionState::PostOpen(post_id) => tiles
                .iter()
                .flat_map(|tile| tile.posts.iter())
                .find(|post| post.id == post_id)
                .map(|post| vec![post.title.as_str()])
                .unwrap_or_default(),
            InteractionState::Hovering(index) | InteractionState::Selected(index) => tiles
                .iter()
                .find(|tile| tile.index == index)
                .map(|tile| tile.posts.iter().map(|post| post.title.as_str()).collect())
                .unwrap_or_default(),
        }
    }
}
