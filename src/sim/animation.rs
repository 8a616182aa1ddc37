//! Per-tile animation state
//!
//! Animatable tiles get a slot in a fixed arena sized to the room, indexed by
//! `row * columns + column`. A bitmap marks live slots so iteration skips empty
//! words and removal is a single bit clear.
//!
//! State machine per slot:
//! - `Default` (initial) --activate--> `Struck`
//! - `Struck` --animation ends--> `Default`, or removed for consumable kinds
//! - holdable kinds restart `Struck` when activated mid-animation

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::gravity::GravityState;
use super::grid::Room;
use super::tile::{SpriteId, TileKind, TilePos};
use crate::error::ConfigError;
use crate::tile_to_pixel;

/// Which sequence a slot is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationName {
    Default,
    Struck,
}

impl AnimationName {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationName::Default => "default",
            AnimationName::Struck => "struck",
        }
    }
}

/// A frame source built from config
pub trait Animation: std::fmt::Debug {
    /// Step one tick. Returns false once a non-looping sequence has finished.
    fn advance(&mut self) -> bool;
    fn current_frame(&self) -> SpriteId;
    /// Index of the frame currently shown
    fn frame_cursor(&self) -> usize;
    fn reset(&mut self);
}

/// Builds animations for a tile kind
pub trait AnimationSource {
    fn build(&self, kind: TileKind, name: AnimationName) -> Option<Box<dyn Animation>>;
}

/// Fixed list of frames, each held for `ticks_per_frame` ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSequence {
    pub frames: Vec<SpriteId>,
    pub ticks_per_frame: u32,
    #[serde(default)]
    pub looping: bool,
    #[serde(skip)]
    frame: usize,
    #[serde(skip)]
    tick: u32,
}

impl FrameSequence {
    pub fn new(frames: Vec<SpriteId>, ticks_per_frame: u32, looping: bool) -> Self {
        Self {
            frames,
            ticks_per_frame,
            looping,
            frame: 0,
            tick: 0,
        }
    }

    /// Ticks from reset until a non-looping sequence reports completion
    pub fn duration(&self) -> u32 {
        self.frames.len() as u32 * self.ticks_per_frame
    }
}

impl Animation for FrameSequence {
    fn advance(&mut self) -> bool {
        if self.frames.is_empty() {
            return false;
        }
        self.tick += 1;
        if self.tick < self.ticks_per_frame.max(1) {
            return true;
        }
        self.tick = 0;
        if self.frame + 1 < self.frames.len() {
            self.frame += 1;
            true
        } else if self.looping {
            self.frame = 0;
            true
        } else {
            false
        }
    }

    fn current_frame(&self) -> SpriteId {
        self.frames.get(self.frame).copied().unwrap_or_default()
    }

    fn frame_cursor(&self) -> usize {
        self.frame
    }

    fn reset(&mut self) {
        self.frame = 0;
        self.tick = 0;
    }
}

/// Snapshot of a registered tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimatedTileState {
    pub kind: TileKind,
    pub animation: AnimationName,
    pub frame_cursor: usize,
}

/// Something the registry changed while advancing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileTransition {
    /// Struck finished, back to Default
    Restored(TilePos),
    /// Consumable removed; the grid cell is now Air
    Consumed(TilePos),
}

/// One animated tile ready to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileFrame {
    pub sprite: SpriteId,
    /// Top-left pixel
    pub position: IVec2,
    /// Flip vertically
    pub mirrored: bool,
}

#[derive(Debug)]
struct AnimatedTile {
    kind: TileKind,
    playing: AnimationName,
    default: Box<dyn Animation>,
    struck: Box<dyn Animation>,
}

impl AnimatedTile {
    fn current(&self) -> &dyn Animation {
        match self.playing {
            AnimationName::Default => self.default.as_ref(),
            AnimationName::Struck => self.struck.as_ref(),
        }
    }

    fn current_mut(&mut self) -> &mut dyn Animation {
        match self.playing {
            AnimationName::Default => self.default.as_mut(),
            AnimationName::Struck => self.struck.as_mut(),
        }
    }
}

/// Animation slots for one room
#[derive(Debug)]
pub struct AnimatedTileRegistry {
    columns: usize,
    rows: usize,
    slots: Vec<Option<AnimatedTile>>,
    active: Vec<u64>,
    count: usize,
}

impl AnimatedTileRegistry {
    /// Empty registry sized for a room
    pub fn empty(columns: usize, rows: usize) -> Self {
        let len = columns * rows;
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || None);
        Self {
            columns,
            rows,
            slots,
            active: vec![0; len.div_ceil(64)],
            count: 0,
        }
    }

    /// Register every animatable tile in a room
    pub fn for_room(room: &Room, source: &dyn AnimationSource) -> Result<Self, ConfigError> {
        let mut registry = Self::empty(room.columns(), room.rows());
        for (pos, kind) in room.iter() {
            if kind.is_animatable() {
                registry.register(pos, kind, source)?;
            }
        }
        log::debug!("Registered {} animated tiles", registry.count);
        Ok(registry)
    }

    /// Add a slot in the Default state, replacing any previous one
    pub fn register(
        &mut self,
        pos: TilePos,
        kind: TileKind,
        source: &dyn AnimationSource,
    ) -> Result<(), ConfigError> {
        let Some(idx) = self.index(pos) else {
            return Ok(());
        };
        let build = |name: AnimationName| {
            source
                .build(kind, name)
                .ok_or(ConfigError::MissingAnimation {
                    kind,
                    animation: name.as_str(),
                })
        };
        let tile = AnimatedTile {
            kind,
            playing: AnimationName::Default,
            default: build(AnimationName::Default)?,
            struck: build(AnimationName::Struck)?,
        };
        if self.slots[idx].replace(tile).is_none() {
            self.count += 1;
        }
        set_bit(&mut self.active, idx);
        Ok(())
    }

    #[inline]
    fn index(&self, pos: TilePos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x as usize >= self.columns || pos.y as usize >= self.rows {
            return None;
        }
        Some(pos.y as usize * self.columns + pos.x as usize)
    }

    #[inline]
    fn position(&self, idx: usize) -> TilePos {
        TilePos::new((idx % self.columns) as i32, (idx / self.columns) as i32)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        self.index(pos).is_some_and(|idx| check_bit(&self.active, idx))
    }

    /// Current state, `None` when the position is not animated
    pub fn state(&self, pos: TilePos) -> Option<AnimatedTileState> {
        let tile = self.slot(pos)?;
        Some(AnimatedTileState {
            kind: tile.kind,
            animation: tile.playing,
            frame_cursor: tile.current().frame_cursor(),
        })
    }

    fn slot(&self, pos: TilePos) -> Option<&AnimatedTile> {
        let idx = self.index(pos)?;
        if !check_bit(&self.active, idx) {
            return None;
        }
        self.slots[idx].as_ref()
    }

    /// Request the Struck animation.
    ///
    /// Accepted (Struck restarts from frame 0) unless Struck is already
    /// playing on a non-holdable kind. Returns whether the request was
    /// accepted, so a holdable tile reports true on every call while a
    /// non-holdable one reports true once until it settles back to Default.
    /// Unregistered positions return false.
    pub fn activate(&mut self, pos: TilePos, kind: TileKind) -> bool {
        let Some(idx) = self.index(pos) else {
            return false;
        };
        if !check_bit(&self.active, idx) {
            return false;
        }
        let Some(tile) = self.slots[idx].as_mut() else {
            return false;
        };

        let accepted = tile.playing != AnimationName::Struck || kind.is_holdable();
        if accepted {
            tile.playing = AnimationName::Struck;
            tile.struck.reset();
        }
        accepted
    }

    /// Whether a position is currently playing Struck
    pub fn is_struck(&self, pos: TilePos) -> bool {
        self.slot(pos)
            .is_some_and(|tile| tile.playing == AnimationName::Struck)
    }

    /// Tick every live slot once, in row-major order. Consumed tiles are
    /// written back to `room` as Air.
    pub fn advance(&mut self, room: &mut Room) -> Vec<TileTransition> {
        let mut transitions = Vec::new();
        for word_idx in 0..self.active.len() {
            let mut bits = self.active[word_idx];
            while bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                let idx = word_idx * 64 + bit;
                if let Some(transition) = self.advance_slot(idx, room) {
                    transitions.push(transition);
                }
            }
        }
        transitions
    }

    fn advance_slot(&mut self, idx: usize, room: &mut Room) -> Option<TileTransition> {
        let pos = self.position(idx);
        let tile = self.slots[idx].as_mut()?;
        if tile.current_mut().advance() {
            return None;
        }

        let (playing, kind) = (tile.playing, tile.kind);
        match playing {
            AnimationName::Struck if kind.is_consumable() => {
                self.slots[idx] = None;
                clear_bit(&mut self.active, idx);
                self.count -= 1;
                room.set(pos, TileKind::Air);
                log::debug!("Consumed tile at {:?}", pos);
                Some(TileTransition::Consumed(pos))
            }
            AnimationName::Struck => {
                tile.playing = AnimationName::Default;
                tile.default.reset();
                Some(TileTransition::Restored(pos))
            }
            AnimationName::Default => {
                // A non-looping idle sequence simply starts over
                tile.default.reset();
                None
            }
        }
    }

    /// Frame to draw for a position, mirrored vertically when the tile's row
    /// is in the reversed half of the gravity line
    pub fn render_frame(&self, pos: TilePos, gravity: &GravityState) -> Option<TileFrame> {
        let tile = self.slot(pos)?;
        Some(TileFrame {
            sprite: tile.current().current_frame(),
            position: tile_to_pixel(pos),
            mirrored: gravity.is_inverted_at(pos.y as f32),
        })
    }

    /// Frames for every live slot, row-major
    pub fn frames(&self, gravity: &GravityState) -> Vec<TileFrame> {
        (0..self.slots.len())
            .filter(|&idx| check_bit(&self.active, idx))
            .filter_map(|idx| self.render_frame(self.position(idx), gravity))
            .collect()
    }
}

#[inline]
fn set_bit(bits: &mut [u64], idx: usize) {
    bits[idx >> 6] |= 1u64 << (idx & 63);
}

#[inline]
fn clear_bit(bits: &mut [u64], idx: usize) {
    bits[idx >> 6] &= !(1u64 << (idx & 63));
}

#[inline]
fn check_bit(bits: &[u64], idx: usize) -> bool {
    bits.get(idx >> 6)
        .is_some_and(|word| word & (1u64 << (idx & 63)) != 0)
}
