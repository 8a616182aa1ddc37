//! Fixed timestep simulation tick
//!
//! Advances a [`World`] by one step. Bodies step in a fixed order (primary,
//! then followers) against the gravity field as it stood at the start of the
//! tick. Springs launch their body immediately; orb and button effects are
//! queued and land once, after the registry advances.

use glam::IVec2;

use super::animation::{AnimatedTileRegistry, TileTransition};
use super::body::{Collisions, PhysicsBody, Rect};
use super::collision::{PhysicsParams, step_body};
use super::gravity::{ButtonId, GravityState};
use super::grid::Room;
use super::state::World;
use super::tile::{TileKind, TilePos, Trigger};
use crate::config::SimConfig;
use crate::pixel_to_tile;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Walk direction for the primary body: -1, 0 or +1
    pub move_x: i32,
    /// Jump (ignored unless on ground)
    pub jump: bool,
    /// Strike the tile the primary body faces
    pub strike: bool,
}

/// A special or strike-triggered tile touched this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileActivation {
    pub kind: TileKind,
    pub pos: TilePos,
    /// Index into [`World::bodies`] order
    pub body: usize,
    /// The tile was not already playing Struck when touched. Effects only fire
    /// on fresh activations. Tiles without animation state are always fresh.
    pub fresh: bool,
}

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Contact flags per body, primary first
    pub collisions: Vec<Collisions>,
    pub activations: Vec<TileActivation>,
    pub transitions: Vec<TileTransition>,
    /// New active room, if the primary body crossed into one
    pub room_switch: Option<usize>,
}

/// Borrowed pieces of the world a single body step touches
struct StepContext<'a> {
    room: &'a Room,
    gravity: &'a GravityState,
    registry: &'a mut AnimatedTileRegistry,
    config: &'a SimConfig,
    params: PhysicsParams,
    /// Fresh orb and button hits, applied after every body has moved
    gravity_events: Vec<(TileKind, TilePos)>,
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput) -> TickReport {
    let mut report = TickReport::default();
    world.time_ticks += 1;

    let room_index = world.room_index();
    let World {
        level,
        primary,
        followers,
        gravity,
        registry,
        config,
        ..
    } = &mut *world;
    let Some(room) = level.room(room_index) else {
        return report;
    };
    let params = config.physics();
    let mut ctx = StepContext {
        room,
        gravity,
        registry,
        config,
        params,
        gravity_events: Vec::new(),
    };

    if input.jump && primary.on_ground() {
        primary.launch(ctx.config.jump_speed);
    }
    let dx = input.move_x.signum() * ctx.config.walk_speed;
    step(primary, 0, dx, input.strike, &mut ctx, &mut report);

    for (i, follower) in followers.iter_mut().enumerate() {
        let dx = follow_dx(follower, primary, ctx.config);
        step(follower, i + 1, dx, false, &mut ctx, &mut report);
    }
    let gravity_events = ctx.gravity_events;

    if let Some(room) = world.level.room_mut(room_index) {
        report.transitions = world.registry.advance(room);
    }
    for (kind, pos) in gravity_events {
        match kind {
            TileKind::GravityOrb => world.gravity.flip_polarity(),
            TileKind::GravityButton => world.gravity.press_button(
                ButtonId {
                    room: room_index,
                    pos,
                },
                world.config.button_beam_delta,
            ),
            _ => {}
        }
    }
    for transition in &report.transitions {
        if let TileTransition::Consumed(pos) = *transition {
            world.appearance.invalidate(&world.level, room_index, pos);
        }
    }

    report.room_switch = cross_room(world);
    report
}

fn step(
    body: &mut PhysicsBody,
    index: usize,
    dx: i32,
    strike: bool,
    ctx: &mut StepContext<'_>,
    report: &mut TickReport,
) {
    step_body(body, ctx.room, ctx.gravity, &ctx.params, dx);
    report.collisions.push(body.collisions);

    for pos in overlapped_cells(body.rect) {
        if let Some(kind) = ctx.room.get(pos) {
            if kind.trigger() == Some(Trigger::Overlap) {
                activate(body, index, pos, kind, ctx, report);
            }
        }
    }

    // Explicit strike on the faced tile, then a head-bump against gravity
    let mut strikes = Vec::with_capacity(2);
    if strike {
        strikes.push(body.cached_tile + IVec2::new(body.facing, 0));
    }
    if body.collisions.hit_head(body.local_gravity_dir) {
        strikes.extend(body.collisions.vertical_contact);
    }
    for pos in strikes {
        if let Some(kind) = ctx.room.get(pos) {
            if kind.trigger() == Some(Trigger::Strike) {
                activate(body, index, pos, kind, ctx, report);
            }
        }
    }
}

fn activate(
    body: &mut PhysicsBody,
    index: usize,
    pos: TilePos,
    kind: TileKind,
    ctx: &mut StepContext<'_>,
    report: &mut TickReport,
) {
    let fresh = if kind.is_animatable() {
        let fresh = !ctx.registry.is_struck(pos);
        ctx.registry.activate(pos, kind);
        fresh
    } else {
        true
    };
    report.activations.push(TileActivation {
        kind,
        pos,
        body: index,
        fresh,
    });
    if !fresh {
        return;
    }

    log::debug!("Body {} activated {:?} at {:?}", index, kind, pos);
    match kind {
        TileKind::GravityOrb | TileKind::GravityButton => ctx.gravity_events.push((kind, pos)),
        TileKind::Spring => body.launch(ctx.config.spring_speed),
        _ => {}
    }
}

/// Cells a rect strictly overlaps, row-major
fn overlapped_cells(rect: Rect) -> impl Iterator<Item = TilePos> {
    let min = pixel_to_tile(rect.pos);
    let max = pixel_to_tile(rect.pos + rect.size - IVec2::ONE);
    (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| TilePos::new(x, y)))
}

/// Follower steering: hold `follower_distance` behind the primary's facing
fn follow_dx(follower: &PhysicsBody, primary: &PhysicsBody, config: &SimConfig) -> i32 {
    let target = primary.rect.pos.x - primary.facing * config.follower_distance;
    (target - follower.rect.pos.x).clamp(-config.follower_speed, config.follower_speed)
}

/// Move to the neighbouring room when the primary's centre leaves the active
/// one; clamp bodies at the level's outer ends.
fn cross_room(world: &mut World) -> Option<usize> {
    let width = world.room_width_px();
    let index = world.room_index();
    let center_x = world.primary.rect.center().x;

    let (mut next, shift) = if center_x < 0 && index > 0 {
        (index - 1, width)
    } else if center_x >= width && index + 1 < world.level.room_count() {
        (index + 1, -width)
    } else {
        (index, 0)
    };

    if next != index {
        match world.switch_room(next) {
            Ok(()) => {
                let shift = IVec2::new(shift, 0);
                world.primary.teleport(world.primary.rect.pos + shift);
                for follower in &mut world.followers {
                    follower.teleport(follower.rect.pos + shift);
                }
            }
            Err(err) => {
                log::warn!("Room switch to {} failed: {}", next, err);
                next = index;
            }
        }
    }

    let has_prev = world.room_index() > 0;
    let has_next = world.room_index() + 1 < world.level.room_count();
    clamp_to_level(&mut world.primary, width, has_prev, has_next);
    for follower in &mut world.followers {
        // Followers never lead a room switch
        clamp_to_level(follower, width, false, false);
    }

    (next != index).then_some(next)
}

fn clamp_to_level(body: &mut PhysicsBody, width: i32, has_prev: bool, has_next: bool) {
    let x = body.rect.pos.x;
    let mut clamped = x;
    if !has_prev {
        clamped = clamped.max(0);
    }
    if !has_next {
        clamped = clamped.min(width - body.rect.size.x);
    }
    if clamped != x {
        body.teleport(IVec2::new(clamped, body.rect.pos.y));
    }
}
