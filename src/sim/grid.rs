//! Room and level grids
//!
//! A level is an ordered list of equally sized rooms. Rooms are read-only
//! except for [`Room::set`], which the animation registry uses to clear
//! consumed tiles.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::tile::{TileKind, TilePos};
use crate::error::LevelError;

/// A fixed-size grid of tiles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    columns: usize,
    rows: usize,
    /// Row-major; a row may be shorter than `columns`
    cells: Vec<Vec<TileKind>>,
}

impl Room {
    /// Build a room from rows of tiles. Width is the longest row.
    pub fn from_rows(cells: Vec<Vec<TileKind>>) -> Self {
        let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
        let rows = cells.len();
        for (row, cells) in cells.iter().enumerate() {
            if cells.len() < columns {
                log::warn!(
                    "row {} has {} of {} tiles, missing cells read as solid",
                    row,
                    cells.len(),
                    columns
                );
            }
        }
        Self {
            columns,
            rows,
            cells,
        }
    }

    /// Parse symbol rows such as `"#..#"`
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, LevelError> {
        Self::parse_indexed(0, rows)
    }

    fn parse_indexed<S: AsRef<str>>(room: usize, rows: &[S]) -> Result<Self, LevelError> {
        let mut cells = Vec::with_capacity(rows.len());
        for (row, line) in rows.iter().enumerate() {
            let parsed = line
                .as_ref()
                .chars()
                .enumerate()
                .map(|(column, symbol)| {
                    TileKind::from_symbol(symbol).ok_or(LevelError::UnknownTile {
                        symbol,
                        room,
                        row,
                        column,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            cells.push(parsed);
        }
        let parsed = Self::from_rows(cells);
        if parsed.columns == 0 || parsed.rows == 0 {
            return Err(LevelError::EmptyRoom { room });
        }
        Ok(parsed)
    }

    /// A room filled with one kind
    pub fn filled(columns: usize, rows: usize, kind: TileKind) -> Self {
        Self {
            columns,
            rows,
            cells: vec![vec![kind; columns]; rows],
        }
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Whether a position lies inside the declared room size
    #[inline]
    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.columns && (pos.y as usize) < self.rows
    }

    /// Tile at a position, `None` outside the room or past the end of a short row
    #[inline]
    pub fn get(&self, pos: TilePos) -> Option<TileKind> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        self.cells
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
            .copied()
    }

    /// Replace a tile. Returns false when the cell does not exist.
    pub fn set(&mut self, pos: TilePos, kind: TileKind) -> bool {
        if pos.x < 0 || pos.y < 0 {
            return false;
        }
        match self
            .cells
            .get_mut(pos.y as usize)
            .and_then(|row| row.get_mut(pos.x as usize))
        {
            Some(cell) => {
                *cell = kind;
                true
            }
            None => false,
        }
    }

    /// Blocks movement: solid tiles and missing cells
    #[inline]
    pub fn is_blocking(&self, pos: TilePos) -> bool {
        self.get(pos).is_none_or(TileKind::is_solid)
    }

    /// Every existing cell in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (TilePos, TileKind)> + '_ {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, kind)| (TilePos::new(x as i32, y as i32), *kind))
        })
    }
}

/// Result of a cross-room cell lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellLookup {
    Tile(TileKind),
    /// Outside the room vertically, or a missing cell in a short row
    Missing,
    /// Past the first or last room of the level
    Boundary,
}

/// Ordered rooms; order is traversal order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub name: String,
    rooms: Vec<Room>,
}

/// JSON form of a level: rooms of symbol rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelFile {
    #[serde(default)]
    pub name: String,
    pub rooms: Vec<Vec<String>>,
}

impl Level {
    /// Build a level, requiring every room to share the first room's size
    pub fn from_rooms(name: impl Into<String>, rooms: Vec<Room>) -> Result<Self, LevelError> {
        let first = rooms.first().ok_or(LevelError::Empty)?;
        let (expected_columns, expected_rows) = (first.columns, first.rows);
        for (index, room) in rooms.iter().enumerate() {
            if room.columns == 0 || room.rows == 0 {
                return Err(LevelError::EmptyRoom { room: index });
            }
            if room.columns != expected_columns || room.rows != expected_rows {
                return Err(LevelError::SizeMismatch {
                    room: index,
                    columns: room.columns,
                    rows: room.rows,
                    expected_columns,
                    expected_rows,
                });
            }
        }
        Ok(Self {
            name: name.into(),
            rooms,
        })
    }

    /// Parse rooms given as symbol rows
    pub fn parse<S: AsRef<str>>(name: &str, rooms: &[Vec<S>]) -> Result<Self, LevelError> {
        let rooms = rooms
            .iter()
            .enumerate()
            .map(|(index, rows)| Room::parse_indexed(index, rows))
            .collect::<Result<Vec<_>, _>>()?;
        let level = Self::from_rooms(name, rooms)?;
        log::info!(
            "Loaded level '{}': {} rooms of {}x{}",
            level.name,
            level.rooms.len(),
            level.columns(),
            level.rows()
        );
        Ok(level)
    }

    pub fn from_file(file: &LevelFile) -> Result<Self, LevelError> {
        Self::parse(&file.name, &file.rooms)
    }

    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let file: LevelFile = serde_json::from_str(json)?;
        Self::from_file(&file)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, index: usize) -> Option<&Room> {
        self.rooms.get(index)
    }

    pub fn room_mut(&mut self, index: usize) -> Option<&mut Room> {
        self.rooms.get_mut(index)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn columns(&self) -> usize {
        self.rooms[0].columns
    }

    pub fn rows(&self) -> usize {
        self.rooms[0].rows
    }

    /// Look up a cell relative to a room, stepping into the previous or next
    /// room when the column falls outside it. Rows never cross rooms.
    pub fn cell(&self, room_index: usize, pos: TilePos) -> CellLookup {
        let Some(room) = self.rooms.get(room_index) else {
            return CellLookup::Boundary;
        };
        if pos.y < 0 || pos.y as usize >= room.rows {
            return CellLookup::Missing;
        }

        let columns = room.columns as i32;
        let (index, column) = if pos.x < 0 {
            if room_index == 0 {
                return CellLookup::Boundary;
            }
            (room_index - 1, pos.x + columns)
        } else if pos.x >= columns {
            if room_index + 1 >= self.rooms.len() {
                return CellLookup::Boundary;
            }
            (room_index + 1, pos.x - columns)
        } else {
            (room_index, pos.x)
        };

        if column < 0 || column >= columns {
            // More than one room away
            return CellLookup::Boundary;
        }
        match self.rooms[index].get(TilePos::new(column, pos.y)) {
            Some(kind) => CellLookup::Tile(kind),
            None => CellLookup::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_room_level() -> Level {
        Level::parse("test", &[vec!["#..", "...", "###"], vec!["..#", "^..", "###"]]).unwrap()
    }

    #[test]
    fn test_parse_rejects_unknown_symbol() {
        let err = Level::parse("bad", &[vec!["#.", "#x"]]).unwrap_err();
        match err {
            LevelError::UnknownTile {
                symbol,
                room,
                row,
                column,
            } => {
                assert_eq!((symbol, room, row, column), ('x', 0, 1, 1));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_rooms_must_share_size() {
        let err = Level::parse("bad", &[vec!["##", "##"], vec!["###", "###"]]).unwrap_err();
        assert!(matches!(err, LevelError::SizeMismatch { room: 1, .. }));
        assert!(matches!(
            Level::from_rooms("none", Vec::new()),
            Err(LevelError::Empty)
        ));
    }

    #[test]
    fn test_short_row_reads_as_missing_and_blocking() {
        let room = Room::parse(&["###", "#", "###"]).unwrap();
        assert_eq!(room.columns(), 3);
        assert_eq!(room.get(TilePos::new(2, 1)), None);
        assert!(room.is_blocking(TilePos::new(2, 1)));
        assert!(room.is_blocking(TilePos::new(0, -1)));
    }

    #[test]
    fn test_cross_room_lookup() {
        let level = two_room_level();
        // Column past room 0 reads room 1's first column
        assert_eq!(
            level.cell(0, TilePos::new(3, 1)),
            CellLookup::Tile(TileKind::Spikes(crate::sim::SpikeDir::Up))
        );
        // Column -1 of room 1 reads room 0's last column
        assert_eq!(
            level.cell(1, TilePos::new(-1, 0)),
            CellLookup::Tile(TileKind::Air)
        );
        assert_eq!(level.cell(0, TilePos::new(-1, 0)), CellLookup::Boundary);
        assert_eq!(level.cell(1, TilePos::new(3, 0)), CellLookup::Boundary);
        assert_eq!(level.cell(0, TilePos::new(0, 3)), CellLookup::Missing);
    }

    #[test]
    fn test_set_replaces_tile() {
        let mut room = Room::parse(&["C."]).unwrap();
        assert!(room.set(TilePos::new(0, 0), TileKind::Air));
        assert_eq!(room.get(TilePos::new(0, 0)), Some(TileKind::Air));
        assert!(!room.set(TilePos::new(5, 0), TileKind::Air));
    }

    #[test]
    fn test_level_from_json() {
        let level = Level::from_json(r##"{"name":"j","rooms":[["#.",".#"]]}"##).unwrap();
        assert_eq!(level.room_count(), 1);
        assert_eq!(level.columns(), 2);
        assert_eq!(level.name, "j");
    }

    #[test]
    fn test_bundled_demo_level_parses() {
        let level = Level::from_json(include_str!("../../assets/levels/demo.json")).unwrap();
        assert_eq!(level.room_count(), 2);
        assert_eq!((level.columns(), level.rows()), crate::consts::SCREEN_TILE_SIZE);
        // Rooms connect through open border columns
        assert_eq!(level.cell(0, TilePos::new(20, 6)), CellLookup::Tile(TileKind::Air));
    }
}
