//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (row-major cells, primary body first)
//! - No rendering or platform dependencies

pub mod animation;
pub mod appearance;
pub mod body;
pub mod collision;
pub mod gravity;
pub mod grid;
pub mod state;
pub mod tick;
pub mod tile;

pub use animation::{
    AnimatedTileRegistry, AnimatedTileState, Animation, AnimationName, AnimationSource,
    FrameSequence, TileFrame, TileTransition,
};
pub use appearance::{
    AppearanceCache, AppearanceOptions, DrawCommand, LevelAppearance, RoomView, resolve_cell,
    resolve_room,
};
pub use body::{Collisions, PhysicsBody, Rect};
pub use collision::{Axis, PhysicsParams, move_horizontal, move_vertical, resolve_axis, step_body};
pub use gravity::{ButtonId, GravityState, Polarity};
pub use grid::{CellLookup, Level, LevelFile, Room};
pub use state::World;
pub use tick::{TickInput, TickReport, TileActivation, tick};
pub use tile::{Rotation, SpikeDir, SpriteId, TileCategory, TileKind, TilePos, Trigger};
