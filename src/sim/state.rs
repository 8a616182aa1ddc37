//! Active level context
//!
//! Everything one tick reads or writes: the level grids, the active room, the
//! bodies, the shared gravity line and the per-room caches.

use glam::IVec2;

use super::animation::{AnimatedTileRegistry, TileFrame};
use super::appearance::{DrawCommand, LevelAppearance};
use super::body::PhysicsBody;
use super::gravity::GravityState;
use super::grid::{Level, Room};
use crate::config::SimConfig;
use crate::consts::TILE_SIZE;
use crate::error::{Error, LevelError};
use crate::tileset::TileSet;

/// Simulation state for one level
#[derive(Debug)]
pub struct World {
    pub level: Level,
    room_index: usize,
    /// Player-controlled body; always steps first
    pub primary: PhysicsBody,
    /// Bodies steering toward the primary, in registration order
    pub followers: Vec<PhysicsBody>,
    pub gravity: GravityState,
    /// Animation slots for the active room
    pub registry: AnimatedTileRegistry,
    pub appearance: LevelAppearance,
    pub config: SimConfig,
    pub tileset: TileSet,
    pub time_ticks: u64,
}

impl World {
    /// Start in the first room with the primary body's top-left at `spawn` (pixels)
    pub fn new(level: Level, tileset: TileSet, config: SimConfig, spawn: IVec2) -> Result<Self, Error> {
        config.validate()?;
        let room = level.room(0).ok_or(LevelError::Empty)?;
        let registry = AnimatedTileRegistry::for_room(room, &tileset)?;
        let appearance = LevelAppearance::new(&level, config.appearance())?;
        log::info!(
            "World ready: level '{}', {} rooms of {}x{}",
            level.name,
            level.room_count(),
            level.columns(),
            level.rows()
        );
        Ok(Self {
            gravity: config.initial_gravity(),
            level,
            room_index: 0,
            primary: PhysicsBody::at(spawn.x, spawn.y),
            followers: Vec::new(),
            registry,
            appearance,
            config,
            tileset,
            time_ticks: 0,
        })
    }

    #[inline]
    pub fn room_index(&self) -> usize {
        self.room_index
    }

    /// Active room grid
    pub fn room(&self) -> &Room {
        // room_index is only ever set to a validated index
        &self.level.rooms()[self.room_index]
    }

    /// Room width in pixels
    pub fn room_width_px(&self) -> i32 {
        self.level.columns() as i32 * TILE_SIZE
    }

    pub fn add_follower(&mut self, spawn: IVec2) {
        self.followers.push(PhysicsBody::at(spawn.x, spawn.y));
    }

    /// Primary first, then followers
    pub fn bodies(&self) -> impl Iterator<Item = &PhysicsBody> {
        std::iter::once(&self.primary).chain(self.followers.iter())
    }

    /// Make another room active. Animation state for the new room starts over
    /// from Default; tiles consumed earlier stay gone because they were
    /// written back to the level.
    pub fn switch_room(&mut self, index: usize) -> Result<(), Error> {
        let room = self.level.room(index).ok_or(LevelError::RoomOutOfRange {
            index,
            count: self.level.room_count(),
        })?;
        self.registry = AnimatedTileRegistry::for_room(room, &self.tileset)?;
        self.room_index = index;
        self.primary.refresh_tile();
        for follower in &mut self.followers {
            follower.refresh_tile();
        }
        log::debug!("Switched to room {}", index);
        Ok(())
    }

    /// Draw list for the active room, reusing cached cells
    pub fn draw_commands(&mut self) -> Vec<DrawCommand> {
        self.appearance
            .commands(&self.level, self.room_index, &self.tileset)
    }

    /// Animated tile frames for the active room
    pub fn tile_frames(&self) -> Vec<TileFrame> {
        self.registry.frames(&self.gravity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{AnimationName, TileKind, TilePos};

    fn world(rooms: &[Vec<&str>]) -> World {
        let level = Level::parse("test", rooms).unwrap();
        World::new(level, TileSet::builtin().unwrap(), SimConfig::default(), IVec2::new(16, 16)).unwrap()
    }

    #[test]
    fn test_new_registers_first_room() {
        let world = world(&[vec![".Q.", "..."], vec!["o..", "..."]]);
        assert_eq!(world.room_index(), 0);
        assert_eq!(world.registry.len(), 1);
        assert_eq!(world.bodies().count(), 1);
        assert_eq!(world.tile_frames().len(), 1);
    }

    #[test]
    fn test_switch_room_rebuilds_registry() {
        let mut world = world(&[vec![".Q.", "..."], vec!["o=.", "..."]]);
        world.registry.activate(TilePos::new(1, 0), TileKind::Bumper);
        world.switch_room(1).unwrap();
        assert_eq!(world.room_index(), 1);
        assert_eq!(world.registry.len(), 2);
        assert_eq!(world.room().get(TilePos::new(0, 0)), Some(TileKind::GravityOrb));

        world.switch_room(0).unwrap();
        let state = world.registry.state(TilePos::new(1, 0)).unwrap();
        assert_eq!(state.animation, AnimationName::Default);
    }

    #[test]
    fn test_switch_room_out_of_range() {
        let mut world = world(&[vec!["..."]]);
        assert!(matches!(
            world.switch_room(3),
            Err(Error::Level(LevelError::RoomOutOfRange { index: 3, count: 1 }))
        ));
        assert_eq!(world.room_index(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let level = Level::parse("test", &[vec!["..."]]).unwrap();
        let config = SimConfig {
            background: TileKind::Air,
            ..Default::default()
        };
        assert!(World::new(level, TileSet::builtin().unwrap(), config, IVec2::ZERO).is_err());
    }
}
