//! Flipline - tile platformer simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid collision, tile appearance, tile animation, gravity line)
//! - `config`: Data-driven simulation settings
//! - `tileset`: Sprite and animation tables keyed by tile kind
//! - `error`: Load-time error types

pub mod config;
pub mod error;
pub mod sim;
pub mod tileset;

pub use config::SimConfig;
pub use error::{ConfigError, Error, LevelError};
pub use tileset::TileSet;

use glam::IVec2;

/// Simulation constants
pub mod consts {
    /// Tile edge length in pixels
    pub const TILE_SIZE: i32 = 16;
    /// Default room size in tiles (columns, rows)
    pub const SCREEN_TILE_SIZE: (usize, usize) = (20, 15);

    /// Fixed simulation rate used by the demo driver
    pub const SIM_HZ: u32 = 60;

    /// Gravity acceleration (pixels/tick²)
    pub const GRAVITY: f32 = 0.5;
    /// Terminal fall speed (pixels/tick); rounded up it must stay below half a body
    pub const MAX_FALL_SPEED: f32 = 7.0;
    /// Launch speed for a jump (pixels/tick)
    pub const JUMP_SPEED: f32 = 6.5;
    /// Launch speed for a spring tile (pixels/tick)
    pub const SPRING_SPEED: f32 = 7.0;
    /// Horizontal walk speed (pixels/tick)
    pub const WALK_SPEED: i32 = 2;

    /// Opacity of the background fill behind transparent cells
    pub const BACKGROUND_ALPHA: f32 = 0.35;
    /// Rows the gravity beam moves per button press
    pub const BUTTON_BEAM_DELTA: f32 = 3.0;

    /// Default body size (pixels)
    pub const BODY_SIZE: i32 = 16;
}

/// Tile that contains a pixel coordinate (floor division, so negative pixels map to negative tiles)
#[inline]
pub fn pixel_to_tile(pixel: IVec2) -> IVec2 {
    IVec2::new(
        pixel.x.div_euclid(consts::TILE_SIZE),
        pixel.y.div_euclid(consts::TILE_SIZE),
    )
}

/// Top-left pixel of a tile
#[inline]
pub fn tile_to_pixel(tile: IVec2) -> IVec2 {
    tile * consts::TILE_SIZE
}
