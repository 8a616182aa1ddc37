//! Composed tile appearance
//!
//! Solid cells get a body sprite plus edge and corner overlays derived from
//! which neighbours are transparent. Transparent cells get a faded background
//! fill and, for directional tiles, a rotated decoration.
//!
//! Output is a pure function of the grid, the background kind and the
//! neighbouring rooms. Every rule reads at most one cell away, so a change to
//! one cell only invalidates its 3x3 neighbourhood.
//!
//! Art conventions: edge sprites face north at 0°, corner and inverse-corner
//! sprites face north-east at 0°; all rotations are clockwise. Corner art is
//! authored rotationally symmetric so every diagonal uses the same rule.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::grid::{CellLookup, Level, Room};
use super::tile::{Rotation, SpriteId, TileKind, TilePos};
use crate::error::ConfigError;
use crate::tile_to_pixel;
use crate::tileset::TileSet;

/// One sprite to draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawCommand {
    pub sprite: SpriteId,
    /// Top-left pixel of the cell
    pub position: IVec2,
    pub rotation: Rotation,
    pub alpha: f32,
}

/// Orthogonal neighbour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    pub fn offset(self) -> IVec2 {
        match self {
            Side::North => IVec2::new(0, -1),
            Side::East => IVec2::new(1, 0),
            Side::South => IVec2::new(0, 1),
            Side::West => IVec2::new(-1, 0),
        }
    }

    pub fn rotation(self) -> Rotation {
        match self {
            Side::North => Rotation::Deg0,
            Side::East => Rotation::Deg90,
            Side::South => Rotation::Deg180,
            Side::West => Rotation::Deg270,
        }
    }
}

/// Diagonal neighbour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagonal {
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

impl Diagonal {
    pub const ALL: [Diagonal; 4] = [
        Diagonal::NorthEast,
        Diagonal::SouthEast,
        Diagonal::SouthWest,
        Diagonal::NorthWest,
    ];

    /// The vertical and horizontal sides this corner sits between
    pub fn sides(self) -> (Side, Side) {
        match self {
            Diagonal::NorthEast => (Side::North, Side::East),
            Diagonal::SouthEast => (Side::South, Side::East),
            Diagonal::SouthWest => (Side::South, Side::West),
            Diagonal::NorthWest => (Side::North, Side::West),
        }
    }

    pub fn offset(self) -> IVec2 {
        let (a, b) = self.sides();
        a.offset() + b.offset()
    }

    pub fn rotation(self) -> Rotation {
        match self {
            Diagonal::NorthEast => Rotation::Deg0,
            Diagonal::SouthEast => Rotation::Deg90,
            Diagonal::SouthWest => Rotation::Deg180,
            Diagonal::NorthWest => Rotation::Deg270,
        }
    }
}

/// Resolver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppearanceOptions {
    /// Solid kind whose body sprite fills transparent cells
    pub background: TileKind,
    pub background_alpha: f32,
    /// Treat columns past the first/last room as transparent
    pub open_level_edges: bool,
}

impl Default for AppearanceOptions {
    fn default() -> Self {
        Self {
            background: TileKind::Brick,
            background_alpha: crate::consts::BACKGROUND_ALPHA,
            open_level_edges: false,
        }
    }
}

impl AppearanceOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.background.is_solid() {
            return Err(ConfigError::BackgroundNotSolid(self.background));
        }
        Ok(())
    }
}

/// A room plus what lies beside it
#[derive(Debug, Clone, Copy)]
pub struct RoomView<'a> {
    pub room: &'a Room,
    /// Level and this room's index, for lookups past the room's columns
    pub level: Option<(&'a Level, usize)>,
}

impl<'a> RoomView<'a> {
    /// Room on its own; columns outside it count as level boundary
    pub fn isolated(room: &'a Room) -> Self {
        Self { room, level: None }
    }

    pub fn in_level(level: &'a Level, index: usize) -> Option<Self> {
        Some(Self {
            room: level.room(index)?,
            level: Some((level, index)),
        })
    }

    fn lookup(&self, pos: TilePos) -> CellLookup {
        if pos.y < 0 || pos.y as usize >= self.room.rows() {
            return CellLookup::Missing;
        }
        if pos.x >= 0 && (pos.x as usize) < self.room.columns() {
            return match self.room.get(pos) {
                Some(kind) => CellLookup::Tile(kind),
                None => CellLookup::Missing,
            };
        }
        match self.level {
            Some((level, index)) => level.cell(index, pos),
            None => CellLookup::Boundary,
        }
    }

    /// Neighbour transparency; missing cells are solid, level edges per `open_edges`
    pub fn is_transparent(&self, pos: TilePos, open_edges: bool) -> bool {
        match self.lookup(pos) {
            CellLookup::Tile(kind) => kind.is_transparent(),
            CellLookup::Missing => false,
            CellLookup::Boundary => open_edges,
        }
    }
}

/// Draw commands for a single cell, appended to `out`
pub fn resolve_cell(
    view: &RoomView<'_>,
    pos: TilePos,
    tileset: &TileSet,
    options: &AppearanceOptions,
    out: &mut Vec<DrawCommand>,
) {
    let Some(kind) = view.room.get(pos) else {
        return;
    };
    let position = tile_to_pixel(pos);
    let command = |sprite, rotation| DrawCommand {
        sprite,
        position,
        rotation,
        alpha: 1.0,
    };

    if kind.is_transparent() {
        if let Some(fill) = tileset.solid(options.background) {
            out.push(DrawCommand {
                alpha: options.background_alpha,
                ..command(fill.body, Rotation::Deg0)
            });
        }
        if let (Some(rotation), Some(sprite)) =
            (kind.decoration_rotation(), tileset.decoration(kind))
        {
            out.push(command(sprite, rotation));
        }
        return;
    }

    let Some(sprites) = tileset.solid(kind) else {
        return;
    };
    let open = options.open_level_edges;
    let transparent = |offset: IVec2| view.is_transparent(pos + offset, open);

    out.push(command(sprites.body, Rotation::Deg0));

    for side in Side::ALL {
        if transparent(side.offset()) {
            out.push(command(sprites.edge, side.rotation()));
        }
    }

    for diagonal in Diagonal::ALL {
        let (a, b) = diagonal.sides();
        let edge_a = transparent(a.offset());
        let edge_b = transparent(b.offset());
        if edge_a && edge_b {
            out.push(command(sprites.corner, diagonal.rotation()));
        } else if !edge_a && !edge_b && transparent(diagonal.offset()) {
            out.push(command(sprites.inverse_corner, diagonal.rotation()));
        }
    }
}

/// Draw commands for a whole room, row-major
pub fn resolve_room(
    view: &RoomView<'_>,
    tileset: &TileSet,
    options: &AppearanceOptions,
) -> Vec<DrawCommand> {
    let mut out = Vec::new();
    for (pos, _) in view.room.iter() {
        resolve_cell(view, pos, tileset, options, &mut out);
    }
    out
}

/// Per-cell command lists for one room, recomputed lazily
#[derive(Debug, Clone)]
pub struct AppearanceCache {
    columns: usize,
    rows: usize,
    cells: Vec<Vec<DrawCommand>>,
    dirty: Vec<bool>,
}

impl AppearanceCache {
    /// Everything starts dirty
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![Vec::new(); columns * rows],
            dirty: vec![true; columns * rows],
        }
    }

    /// Mark a cell's 3x3 neighbourhood for recomputation. `pos` may lie just
    /// outside the room, which dirties the border cells next to it.
    pub fn invalidate(&mut self, pos: TilePos) {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let p = pos + IVec2::new(dx, dy);
                if p.x >= 0 && p.y >= 0 && (p.x as usize) < self.columns && (p.y as usize) < self.rows
                {
                    self.dirty[p.y as usize * self.columns + p.x as usize] = true;
                }
            }
        }
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.iter().filter(|&&d| d).count()
    }

    /// Recompute dirty cells
    pub fn refresh(&mut self, view: &RoomView<'_>, tileset: &TileSet, options: &AppearanceOptions) {
        for idx in 0..self.dirty.len() {
            if !self.dirty[idx] {
                continue;
            }
            let pos = TilePos::new((idx % self.columns) as i32, (idx / self.columns) as i32);
            let cell = &mut self.cells[idx];
            cell.clear();
            resolve_cell(view, pos, tileset, options, cell);
            self.dirty[idx] = false;
        }
    }

    /// Cached commands in row-major order
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.cells.iter().flatten().copied().collect()
    }
}

/// One cache per room of a level
#[derive(Debug, Clone)]
pub struct LevelAppearance {
    pub options: AppearanceOptions,
    caches: Vec<AppearanceCache>,
}

impl LevelAppearance {
    pub fn new(level: &Level, options: AppearanceOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let caches = (0..level.room_count())
            .map(|_| AppearanceCache::new(level.columns(), level.rows()))
            .collect();
        Ok(Self { options, caches })
    }

    /// A cell changed kind. Border cells also dirty the neighbouring room,
    /// which reads across the boundary.
    pub fn invalidate(&mut self, level: &Level, room: usize, pos: TilePos) {
        let Some(cache) = self.caches.get_mut(room) else {
            return;
        };
        cache.invalidate(pos);

        let columns = level.columns() as i32;
        if pos.x == 0 && room > 0 {
            self.caches[room - 1].invalidate(TilePos::new(columns, pos.y));
        }
        if pos.x == columns - 1 && room + 1 < self.caches.len() {
            self.caches[room + 1].invalidate(TilePos::new(-1, pos.y));
        }
    }

    /// Draw commands for a room, recomputing whatever is dirty
    pub fn commands(&mut self, level: &Level, room: usize, tileset: &TileSet) -> Vec<DrawCommand> {
        let (Some(view), Some(cache)) = (RoomView::in_level(level, room), self.caches.get_mut(room))
        else {
            return Vec::new();
        };
        cache.refresh(&view, tileset, &self.options);
        cache.commands()
    }

    pub fn cache(&self, room: usize) -> Option<&AppearanceCache> {
        self.caches.get(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SpikeDir;
    use proptest::prelude::*;

    fn tileset() -> TileSet {
        TileSet::builtin().unwrap()
    }

    fn brick() -> crate::tileset::SolidSprites {
        *tileset().solid(TileKind::Brick).unwrap()
    }

    fn cell_commands(room: &Room, pos: TilePos) -> Vec<DrawCommand> {
        let mut out = Vec::new();
        resolve_cell(
            &RoomView::isolated(room),
            pos,
            &tileset(),
            &AppearanceOptions::default(),
            &mut out,
        );
        out
    }

    fn with_sprite(commands: &[DrawCommand], sprite: SpriteId) -> Vec<Rotation> {
        commands
            .iter()
            .filter(|c| c.sprite == sprite)
            .map(|c| c.rotation)
            .collect()
    }

    #[test]
    fn test_isolated_block_edges_and_corners() {
        let room = Room::parse(&["...", ".#.", "..."]).unwrap();
        let sprites = brick();
        let center = cell_commands(&room, TilePos::new(1, 1));

        assert_eq!(center[0].sprite, sprites.body);
        assert_eq!(
            with_sprite(&center, sprites.edge),
            vec![Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270]
        );
        // Both orthogonal neighbours transparent on every diagonal
        assert_eq!(with_sprite(&center, sprites.corner).len(), 4);
        assert!(with_sprite(&center, sprites.inverse_corner).is_empty());

        for (pos, kind) in room.iter() {
            if kind == TileKind::Air {
                let fill = cell_commands(&room, pos);
                assert_eq!(fill.len(), 1);
                assert_eq!(fill[0].sprite, sprites.body);
                assert!(fill[0].alpha < 1.0);
            }
        }
    }

    #[test]
    fn test_no_edge_against_solid_neighbour() {
        let room = Room::parse(&["...", "##.", "..."]).unwrap();
        let sprites = brick();
        let left = cell_commands(&room, TilePos::new(0, 1));
        // West is the level boundary (solid), east is brick
        assert_eq!(
            with_sprite(&left, sprites.edge),
            vec![Rotation::Deg0, Rotation::Deg180]
        );
    }

    #[test]
    fn test_corner_truth_table() {
        let sprites = brick();
        // NE corner of the centre cell under each combination
        let cases = [
            // (north, east, north-east) transparent?
            ((true, true, true), Some(sprites.corner)),
            ((true, true, false), Some(sprites.corner)),
            ((false, false, true), Some(sprites.inverse_corner)),
            ((false, false, false), None),
            ((true, false, true), None),
            ((false, true, true), None),
            ((true, false, false), None),
            ((false, true, false), None),
        ];
        for ((n, e, ne), expected) in cases {
            let sym = |t: bool| if t { '.' } else { '#' };
            let row0: String = ['#', sym(n), sym(ne)].iter().collect();
            let row1: String = ['#', '#', sym(e)].iter().collect();
            let room = Room::parse(&[row0, row1, "###".to_string()]).unwrap();
            let commands = cell_commands(&room, TilePos::new(1, 1));
            let ne_corner: Vec<_> = commands
                .iter()
                .filter(|c| {
                    c.rotation == Rotation::Deg0
                        && (c.sprite == sprites.corner || c.sprite == sprites.inverse_corner)
                })
                .map(|c| c.sprite)
                .collect();
            assert_eq!(ne_corner, expected.into_iter().collect::<Vec<_>>(), "{n} {e} {ne}");
        }
    }

    #[test]
    fn test_spike_decoration_rotation() {
        let room = Room::parse(&["<^>v"]).unwrap();
        let spike = tileset().decoration(TileKind::Spikes(SpikeDir::Up)).unwrap();
        let commands = resolve_room(&RoomView::isolated(&room), &tileset(), &AppearanceOptions::default());
        assert_eq!(
            with_sprite(&commands, spike),
            vec![Rotation::Deg270, Rotation::Deg0, Rotation::Deg90, Rotation::Deg180]
        );
    }

    #[test]
    fn test_cross_room_edges() {
        let level = Level::parse("x", &[vec!["..#"], vec![".##"]]).unwrap();
        let sprites = brick();
        let ts = tileset();
        let options = AppearanceOptions::default();

        // Room 0's last column sees room 1's first column (air) to the east
        let view = RoomView::in_level(&level, 0).unwrap();
        let mut out = Vec::new();
        resolve_cell(&view, TilePos::new(2, 0), &ts, &options, &mut out);
        assert!(with_sprite(&out, sprites.edge).contains(&Rotation::Deg90));

        // Room 1's last column is the level edge: solid unless opened
        let view = RoomView::in_level(&level, 1).unwrap();
        let mut out = Vec::new();
        resolve_cell(&view, TilePos::new(2, 0), &ts, &options, &mut out);
        assert!(!with_sprite(&out, sprites.edge).contains(&Rotation::Deg90));

        let open = AppearanceOptions {
            open_level_edges: true,
            ..options
        };
        let mut out = Vec::new();
        resolve_cell(&view, TilePos::new(2, 0), &ts, &open, &mut out);
        assert!(with_sprite(&out, sprites.edge).contains(&Rotation::Deg90));
    }

    #[test]
    fn test_cross_room_diagonal_corners() {
        let level = Level::parse(
            "x",
            &[vec!["###", "###", "###"], vec![".#.", "###", "###"]],
        )
        .unwrap();
        let sprites = brick();
        let ts = tileset();
        let closed = AppearanceOptions::default();
        let open = AppearanceOptions {
            open_level_edges: true,
            ..closed
        };
        let ne_corners = |view: &RoomView<'_>, pos: TilePos, options: &AppearanceOptions| {
            let mut out = Vec::new();
            resolve_cell(view, pos, &ts, options, &mut out);
            out.iter()
                .filter(|c| {
                    c.rotation == Rotation::Deg0
                        && (c.sprite == sprites.corner || c.sprite == sprites.inverse_corner)
                })
                .map(|c| c.sprite)
                .collect::<Vec<_>>()
        };

        // North and east solid, north-east is room 1's top-left air cell
        let view = RoomView::in_level(&level, 0).unwrap();
        assert_eq!(
            ne_corners(&view, TilePos::new(2, 1), &closed),
            vec![sprites.inverse_corner]
        );
        // Without the level the same cell sees a closed edge
        let room = level.room(0).unwrap();
        assert!(ne_corners(&RoomView::isolated(room), TilePos::new(2, 1), &closed).is_empty());

        // Level end: the off-level diagonal never counts while edges are closed
        let view = RoomView::in_level(&level, 1).unwrap();
        assert!(ne_corners(&view, TilePos::new(2, 1), &closed).is_empty());
        assert!(ne_corners(&view, TilePos::new(2, 2), &closed).is_empty());
        assert_eq!(
            ne_corners(&view, TilePos::new(2, 1), &open),
            vec![sprites.corner]
        );
        assert!(ne_corners(&view, TilePos::new(2, 2), &open).is_empty());
    }

    #[test]
    fn test_background_must_be_solid() {
        let options = AppearanceOptions {
            background: TileKind::Air,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConfigError::BackgroundNotSolid(TileKind::Air))
        ));
    }

    #[test]
    fn test_cache_matches_full_resolve_after_change() {
        let mut level = Level::parse("x", &[vec!["#####", "#.C.#", "#####"], vec!["#...#", "....#", "#####"]]).unwrap();
        let ts = tileset();
        let mut appearance = LevelAppearance::new(&level, AppearanceOptions::default()).unwrap();
        let first = appearance.commands(&level, 0, &ts);
        assert_eq!(appearance.cache(0).unwrap().dirty_count(), 0);

        let crystal = TilePos::new(2, 1);
        let crystal_body = ts.solid(TileKind::Crystal).unwrap().body;
        assert!(first.iter().any(|c| c.sprite == crystal_body));

        level.room_mut(0).unwrap().set(crystal, TileKind::Air);
        appearance.invalidate(&level, 0, crystal);
        assert_eq!(appearance.cache(0).unwrap().dirty_count(), 9);

        let cached = appearance.commands(&level, 0, &ts);
        let full = resolve_room(&RoomView::in_level(&level, 0).unwrap(), &ts, &appearance.options);
        assert_eq!(cached, full);
        assert!(!cached.iter().any(|c| c.sprite == crystal_body));
    }

    #[test]
    fn test_border_change_dirties_neighbour_room() {
        let mut level = Level::parse("x", &[vec!["###", "###"], vec!["###", "###"]]).unwrap();
        let ts = tileset();
        let mut appearance = LevelAppearance::new(&level, AppearanceOptions::default()).unwrap();
        appearance.commands(&level, 0, &ts);
        appearance.commands(&level, 1, &ts);

        let pos = TilePos::new(0, 0);
        level.room_mut(1).unwrap().set(pos, TileKind::Air);
        appearance.invalidate(&level, 1, pos);
        assert_eq!(appearance.cache(0).unwrap().dirty_count(), 2);

        let cached = appearance.commands(&level, 0, &ts);
        let full = resolve_room(&RoomView::in_level(&level, 0).unwrap(), &ts, &appearance.options);
        assert_eq!(cached, full);
        let edge = ts.solid(TileKind::Brick).unwrap().edge;
        assert!(cached.iter().any(|c| c.sprite == edge && c.rotation == Rotation::Deg90));
    }

    fn arb_room() -> impl Strategy<Value = Room> {
        let kinds = prop::sample::select(vec!['.', '#', 'R', 'C', 'o', '^', '=']);
        prop::collection::vec(prop::collection::vec(kinds, 5), 4).prop_map(|rows| {
            let rows: Vec<String> = rows.into_iter().map(|r| r.into_iter().collect()).collect();
            Room::parse(&rows).unwrap()
        })
    }

    proptest! {
        #[test]
        fn prop_resolve_is_idempotent(room in arb_room()) {
            let ts = tileset();
            let view = RoomView::isolated(&room);
            let options = AppearanceOptions::default();
            prop_assert_eq!(resolve_room(&view, &ts, &options), resolve_room(&view, &ts, &options));
        }

        #[test]
        fn prop_one_edge_per_transparent_side(room in arb_room()) {
            let ts = tileset();
            let view = RoomView::isolated(&room);
            let options = AppearanceOptions::default();
            for (pos, kind) in room.iter() {
                let Some(sprites) = ts.solid(kind) else { continue };
                let mut out = Vec::new();
                resolve_cell(&view, pos, &ts, &options, &mut out);
                for side in Side::ALL {
                    let count = out
                        .iter()
                        .filter(|c| c.sprite == sprites.edge && c.rotation == side.rotation())
                        .count();
                    let expected = usize::from(view.is_transparent(pos + side.offset(), false));
                    prop_assert_eq!(count, expected);
                }
            }
        }
    }
}
