//! Load-time error types
//!
//! Nothing in the per-tick simulation fails; every error here is raised while
//! building grids, sprite tables or settings.

use thiserror::Error;

use crate::sim::TileKind;

/// Errors raised while building the sprite/animation tables or settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings or tileset JSON could not be parsed
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A solid tile kind has no body/edge/corner sprite group
    #[error("no sprite group configured for solid tile {0:?}")]
    MissingSpriteGroup(TileKind),

    /// A decorated tile kind has no decoration sprite
    #[error("no decoration sprite configured for tile {0:?}")]
    MissingDecoration(TileKind),

    /// An animatable tile kind lacks one of its animations
    #[error("no '{animation}' animation configured for tile {kind:?}")]
    MissingAnimation { kind: TileKind, animation: &'static str },

    /// A tile kind was configured in a table it does not belong to
    #[error("tile {kind:?} cannot appear in the {table} table")]
    UnexpectedEntry { kind: TileKind, table: &'static str },

    /// The same tile kind was configured twice in one table
    #[error("tile {kind:?} configured twice in the {table} table")]
    DuplicateEntry { kind: TileKind, table: &'static str },

    /// The background fill must come from a solid sprite group
    #[error("background tile {0:?} is not solid")]
    BackgroundNotSolid(TileKind),

    /// An animation with no frames or a zero frame duration
    #[error("animation '{animation}' for tile {kind:?} is empty")]
    EmptyAnimation { kind: TileKind, animation: &'static str },

    /// A numeric setting outside its valid range
    #[error("invalid setting {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Errors raised while loading a level grid
#[derive(Debug, Error)]
pub enum LevelError {
    /// Tile symbol outside the tile alphabet
    #[error("unknown tile symbol {symbol:?} in room {room} at row {row}, column {column}")]
    UnknownTile {
        symbol: char,
        room: usize,
        row: usize,
        column: usize,
    },

    /// A level needs at least one room
    #[error("level has no rooms")]
    Empty,

    /// A room with zero rows or columns
    #[error("room {room} is empty")]
    EmptyRoom { room: usize },

    /// All rooms in a level share one size
    #[error("room {room} is {columns}x{rows}, expected {expected_columns}x{expected_rows}")]
    SizeMismatch {
        room: usize,
        columns: usize,
        rows: usize,
        expected_columns: usize,
        expected_rows: usize,
    },

    /// Room index outside the level
    #[error("room {index} out of range (level has {count} rooms)")]
    RoomOutOfRange { index: usize, count: usize },

    /// Level JSON could not be parsed or read
    #[error("invalid level file: {0}")]
    Json(#[from] serde_json::Error),

    /// Level file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Either kind of load-time failure, for operations that touch both grids and tables
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Level(#[from] LevelError),
}
