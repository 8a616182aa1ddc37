//! Grid collision for axis-aligned bodies
//!
//! Axis-separated: move on one axis, then push the body back out of the first
//! blocking tile in a fixed 3-cell scan. Scans always run in -1, 0, +1 order
//! and stop at the first hit, so ties resolve the same way every tick.
//!
//! Vertical motion rounds toward the body's gravity side (`ceil` when falling
//! toward +y, `floor` toward -y). A body resting on a floor therefore sinks one
//! pixel into it every tick and is pushed back out, which keeps the ground
//! flag set without special cases.

use super::body::{PhysicsBody, Rect};
use super::gravity::GravityState;
use super::grid::Room;
use super::tile::TilePos;
use crate::consts::TILE_SIZE;
use crate::tile_to_pixel;

/// Collision axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Tunables for [`step_body`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    /// Acceleration per tick
    pub gravity: f32,
    /// Clamp on |vertical_velocity|; must stay below half a body height
    pub max_vertical_speed: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: crate::consts::GRAVITY,
            max_vertical_speed: crate::consts::MAX_FALL_SPEED,
        }
    }
}

/// Apply one tick of gravity. Unbounded; callers clamp.
#[inline]
pub fn integrate_gravity(body: &mut PhysicsBody, gravity: f32) {
    body.vertical_velocity -= gravity * body.local_gravity_dir as f32;
}

/// Screen-space pixel delta for a vertical velocity
#[inline]
pub fn vertical_delta(velocity: f32, gravity_dir: i32) -> i32 {
    let delta = -velocity;
    if gravity_dir >= 0 {
        delta.ceil() as i32
    } else {
        delta.floor() as i32
    }
}

fn tile_rect(pos: TilePos) -> Rect {
    let px = tile_to_pixel(pos);
    Rect::new(px.x, px.y, TILE_SIZE, TILE_SIZE)
}

/// Push the body out of the first blocking tile on one side.
///
/// `direction` is a screen-space sign. Horizontal scans the column beside the
/// cached tile (rows -1..+1); vertical scans the row above or below it
/// (columns -1..+1), and a vertical direction of 0 probes the gravity side.
/// Cells outside the room count as solid, except columns on a horizontal scan,
/// which belong to neighbouring rooms and are the caller's concern.
pub fn resolve_axis(body: &mut PhysicsBody, room: &Room, axis: Axis, direction: i32) {
    debug_assert!(
        body.is_tile_fresh(),
        "stale tile cache {:?} for rect {:?}",
        body.cached_tile,
        body.rect
    );

    match axis {
        Axis::Horizontal => resolve_horizontal(body, room, direction.signum()),
        Axis::Vertical => {
            let direction = if direction == 0 {
                body.local_gravity_dir.signum()
            } else {
                direction.signum()
            };
            resolve_vertical(body, room, direction);
        }
    }
}

fn resolve_horizontal(body: &mut PhysicsBody, room: &Room, direction: i32) {
    if direction == 0 {
        return;
    }
    let column = body.cached_tile.x + direction;
    for dy in [-1, 0, 1] {
        let pos = TilePos::new(column, body.cached_tile.y + dy);
        let blocking = if pos.y < 0 || pos.y as usize >= room.rows() {
            true
        } else if pos.x < 0 || pos.x as usize >= room.columns() {
            false
        } else {
            room.is_blocking(pos)
        };
        if !blocking {
            continue;
        }

        let tile = tile_rect(pos);
        let rect = body.rect;
        let rows_overlap = rect.top() < tile.bottom() && rect.bottom() > tile.top();
        if !rows_overlap {
            continue;
        }
        let touching = if direction > 0 {
            rect.right() >= tile.left() && rect.left() < tile.right()
        } else {
            rect.left() <= tile.right() && rect.right() > tile.left()
        };
        if !touching {
            continue;
        }

        if direction > 0 {
            body.rect.pos.x = tile.left() - rect.size.x;
            body.collisions.right = true;
        } else {
            body.rect.pos.x = tile.right();
            body.collisions.left = true;
        }
        body.collisions.horizontal_contact = room.in_bounds(pos).then_some(pos);
        return;
    }
}

fn resolve_vertical(body: &mut PhysicsBody, room: &Room, direction: i32) {
    let row = body.cached_tile.y + direction;
    for dx in [-1, 0, 1] {
        let pos = TilePos::new(body.cached_tile.x + dx, row);
        if !room.is_blocking(pos) {
            continue;
        }

        let tile = tile_rect(pos);
        let rect = body.rect;
        let columns_overlap = rect.left() < tile.right() && rect.right() > tile.left();
        if !columns_overlap {
            continue;
        }
        let touching = if direction > 0 {
            rect.bottom() >= tile.top() && rect.top() < tile.bottom()
        } else {
            rect.top() <= tile.bottom() && rect.bottom() > tile.top()
        };
        if !touching {
            continue;
        }

        if direction > 0 {
            body.rect.pos.y = tile.top() - rect.size.y;
            body.collisions.down = true;
        } else {
            body.rect.pos.y = tile.bottom();
            body.collisions.up = true;
        }
        body.vertical_velocity = 0.0;
        body.collisions.vertical_contact = room.in_bounds(pos).then_some(pos);
        return;
    }
}

/// Move `dx` pixels and resolve the horizontal axis
pub fn move_horizontal(body: &mut PhysicsBody, room: &Room, dx: i32) {
    if dx == 0 {
        return;
    }
    body.rect.pos.x += dx;
    body.refresh_tile();
    resolve_axis(body, room, Axis::Horizontal, dx.signum());
    body.refresh_tile();
}

/// Move by the rounded vertical velocity and resolve the vertical axis
pub fn move_vertical(body: &mut PhysicsBody, room: &Room) {
    let dy = vertical_delta(body.vertical_velocity, body.local_gravity_dir);
    body.rect.pos.y += dy;
    body.refresh_tile();
    resolve_axis(body, room, Axis::Vertical, dy.signum());
    body.refresh_tile();
}

/// Full per-tick pipeline for one body: local gravity, integrate, clamp,
/// horizontal move, vertical move. Flags are cleared first.
pub fn step_body(
    body: &mut PhysicsBody,
    room: &Room,
    gravity: &GravityState,
    params: &PhysicsParams,
    dx: i32,
) {
    body.local_gravity_dir = gravity.local_dir_at_pixel(body.rect.center().y);
    body.collisions = Default::default();

    integrate_gravity(body, params.gravity);
    body.vertical_velocity = body
        .vertical_velocity
        .clamp(-params.max_vertical_speed, params.max_vertical_speed);

    if dx != 0 {
        body.facing = dx.signum();
    }
    move_horizontal(body, room, dx);
    move_vertical(body, room);
}
