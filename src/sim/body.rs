//! Physics bodies
//!
//! Every moving entity shares this struct; entity types differ only in the
//! config that steers them, not in how they collide.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::tile::TilePos;
use crate::pixel_to_tile;

/// Integer pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub pos: IVec2,
    pub size: IVec2,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            pos: IVec2::new(x, y),
            size: IVec2::new(w, h),
        }
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> IVec2 {
        self.pos + self.size / 2
    }

    /// Strict overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

/// Per-direction contact flags, in screen space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Collisions {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Cell that stopped the body on the vertical axis, `None` for room edges
    #[serde(skip)]
    pub vertical_contact: Option<TilePos>,
    /// Cell that stopped the body on the horizontal axis
    #[serde(skip)]
    pub horizontal_contact: Option<TilePos>,
}

impl Collisions {
    /// Standing on something, given the body's local gravity
    pub fn on_ground(&self, gravity_dir: i32) -> bool {
        if gravity_dir >= 0 { self.down } else { self.up }
    }

    /// Bumped something on the side opposite gravity
    pub fn hit_head(&self, gravity_dir: i32) -> bool {
        if gravity_dir >= 0 { self.up } else { self.down }
    }

    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// A rectangle moving through a room grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsBody {
    pub rect: Rect,
    /// Pixels per tick, positive is up the screen
    pub vertical_velocity: f32,
    /// Tile under the rect centre as of the last refresh
    pub cached_tile: TilePos,
    pub collisions: Collisions,
    /// +1 falls toward increasing y, -1 toward decreasing y
    pub local_gravity_dir: i32,
    /// Last horizontal heading, -1 or +1
    pub facing: i32,
}

impl PhysicsBody {
    pub fn new(rect: Rect) -> Self {
        let mut body = Self {
            rect,
            vertical_velocity: 0.0,
            cached_tile: TilePos::ZERO,
            collisions: Collisions::default(),
            local_gravity_dir: 1,
            facing: 1,
        };
        body.refresh_tile();
        body
    }

    /// Body of the default size with its top-left at a pixel position
    pub fn at(x: i32, y: i32) -> Self {
        let size = crate::consts::BODY_SIZE;
        Self::new(Rect::new(x, y, size, size))
    }

    /// Tile under the rect centre, computed now
    #[inline]
    pub fn center_tile(&self) -> TilePos {
        pixel_to_tile(self.rect.center())
    }

    /// Recompute the cached tile from the rect centre. Must run after any
    /// position change before the next grid query.
    pub fn refresh_tile(&mut self) {
        self.cached_tile = self.center_tile();
    }

    #[inline]
    pub fn is_tile_fresh(&self) -> bool {
        self.cached_tile == self.center_tile()
    }

    /// Move the rect, refreshing the tile cache
    pub fn teleport(&mut self, pos: IVec2) {
        self.rect.pos = pos;
        self.refresh_tile();
    }

    pub fn on_ground(&self) -> bool {
        self.collisions.on_ground(self.local_gravity_dir)
    }

    /// Launch against local gravity
    pub fn launch(&mut self, speed: f32) {
        self.vertical_velocity = speed * self.local_gravity_dir as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges_and_overlap() {
        let a = Rect::new(0, 0, 16, 16);
        let b = Rect::new(16, 0, 16, 16);
        assert_eq!(a.right(), 16);
        assert_eq!(a.bottom(), 16);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Rect::new(15, 15, 4, 4)));
    }

    #[test]
    fn test_tile_cache_goes_stale_until_refreshed() {
        let mut body = PhysicsBody::at(0, 0);
        assert_eq!(body.cached_tile, TilePos::new(0, 0));
        body.rect.pos.x += 16;
        assert!(!body.is_tile_fresh());
        body.refresh_tile();
        assert_eq!(body.cached_tile, TilePos::new(1, 0));
    }

    #[test]
    fn test_on_ground_respects_gravity_side() {
        let mut body = PhysicsBody::at(0, 0);
        body.collisions.up = true;
        assert!(!body.on_ground());
        body.local_gravity_dir = -1;
        assert!(body.on_ground());
        body.launch(4.0);
        assert_eq!(body.vertical_velocity, -4.0);
    }
}
