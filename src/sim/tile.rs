//! Tile alphabet and classification
//!
//! Every tile symbol maps to exactly one [`TileKind`]. Classification is
//! exhaustive matching over the enum, so adding a kind forces every table to
//! be updated.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Cell coordinate inside a room (column, row)
pub type TilePos = IVec2;

/// Opaque sprite handle resolved by the renderer
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SpriteId(pub u32);

/// Which way a spike points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpikeDir {
    Up,
    Right,
    Down,
    Left,
}

/// Every tile that can appear in a room grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Empty space
    Air,
    /// Plain wall
    Brick,
    /// Second wall style with its own sprite group
    Rock,
    /// Solid block that plays a bump animation when struck
    Bumper,
    /// Collectible block, removed once its struck animation finishes
    Crystal,
    /// Flips global gravity polarity on contact
    GravityOrb,
    /// Moves the gravity beam on contact, pressing again moves it back
    GravityButton,
    /// Launches a body against gravity on contact
    Spring,
    /// Directional hazard
    Spikes(SpikeDir),
}

/// Solid/transparent split used by collision and appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileCategory {
    Solid,
    Transparent,
    /// Transparent and raises activation events
    Special,
}

/// How a special or animatable tile gets activated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A body overlapping the cell
    Overlap,
    /// An explicit strike request or a head-bump
    Strike,
}

/// Clockwise sprite rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotation from a number of clockwise quarter turns
    pub fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

impl TileKind {
    /// Every kind, in a stable order (used to validate config tables)
    pub const ALL: [TileKind; 12] = [
        TileKind::Air,
        TileKind::Brick,
        TileKind::Rock,
        TileKind::Bumper,
        TileKind::Crystal,
        TileKind::GravityOrb,
        TileKind::GravityButton,
        TileKind::Spring,
        TileKind::Spikes(SpikeDir::Up),
        TileKind::Spikes(SpikeDir::Right),
        TileKind::Spikes(SpikeDir::Down),
        TileKind::Spikes(SpikeDir::Left),
    ];

    pub fn from_symbol(symbol: char) -> Option<Self> {
        let kind = match symbol {
            '.' => TileKind::Air,
            '#' => TileKind::Brick,
            'R' => TileKind::Rock,
            'Q' => TileKind::Bumper,
            'C' => TileKind::Crystal,
            'o' => TileKind::GravityOrb,
            '=' => TileKind::GravityButton,
            's' => TileKind::Spring,
            '^' => TileKind::Spikes(SpikeDir::Up),
            '>' => TileKind::Spikes(SpikeDir::Right),
            'v' => TileKind::Spikes(SpikeDir::Down),
            '<' => TileKind::Spikes(SpikeDir::Left),
            _ => return None,
        };
        Some(kind)
    }

    pub fn symbol(self) -> char {
        match self {
            TileKind::Air => '.',
            TileKind::Brick => '#',
            TileKind::Rock => 'R',
            TileKind::Bumper => 'Q',
            TileKind::Crystal => 'C',
            TileKind::GravityOrb => 'o',
            TileKind::GravityButton => '=',
            TileKind::Spring => 's',
            TileKind::Spikes(SpikeDir::Up) => '^',
            TileKind::Spikes(SpikeDir::Right) => '>',
            TileKind::Spikes(SpikeDir::Down) => 'v',
            TileKind::Spikes(SpikeDir::Left) => '<',
        }
    }

    pub fn category(self) -> TileCategory {
        match self {
            TileKind::Brick | TileKind::Rock | TileKind::Bumper | TileKind::Crystal => {
                TileCategory::Solid
            }
            TileKind::Air => TileCategory::Transparent,
            TileKind::GravityOrb
            | TileKind::GravityButton
            | TileKind::Spring
            | TileKind::Spikes(_) => TileCategory::Special,
        }
    }

    #[inline]
    pub fn is_solid(self) -> bool {
        self.category() == TileCategory::Solid
    }

    /// Air and special tiles
    #[inline]
    pub fn is_transparent(self) -> bool {
        !self.is_solid()
    }

    #[inline]
    pub fn is_special(self) -> bool {
        self.category() == TileCategory::Special
    }

    /// Has a Default/Struck animation pair and a registry slot
    pub fn is_animatable(self) -> bool {
        matches!(
            self,
            TileKind::Bumper
                | TileKind::Crystal
                | TileKind::GravityOrb
                | TileKind::GravityButton
                | TileKind::Spring
        )
    }

    /// Struck animation may restart before it finishes
    pub fn is_holdable(self) -> bool {
        matches!(self, TileKind::GravityButton | TileKind::Spring)
    }

    /// Removed from the grid once the struck animation finishes
    pub fn is_consumable(self) -> bool {
        self == TileKind::Crystal
    }

    pub fn trigger(self) -> Option<Trigger> {
        match self {
            TileKind::Bumper | TileKind::Crystal => Some(Trigger::Strike),
            TileKind::GravityOrb
            | TileKind::GravityButton
            | TileKind::Spring
            | TileKind::Spikes(_) => Some(Trigger::Overlap),
            TileKind::Air | TileKind::Brick | TileKind::Rock => None,
        }
    }

    /// Fixed decoration rotation for directional tiles
    pub fn decoration_rotation(self) -> Option<Rotation> {
        match self {
            TileKind::Spikes(SpikeDir::Up) => Some(Rotation::Deg0),
            TileKind::Spikes(SpikeDir::Right) => Some(Rotation::Deg90),
            TileKind::Spikes(SpikeDir::Down) => Some(Rotation::Deg180),
            TileKind::Spikes(SpikeDir::Left) => Some(Rotation::Deg270),
            _ => None,
        }
    }
}
