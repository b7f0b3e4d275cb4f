//! The 3x3 perception snapshot delivered every turn.
//!
//! The transport strips the wire framing; the core receives nine tile
//! codes in row-major order, top-left first, with the agent at index 4.
//! Missing cells and unknown codes decode to `None` and contribute no
//! information.

use serde::{Deserialize, Serialize};

use crate::types::{Coord, Direction, TileKind};

/// Relative offsets of the nine vision cells, row-major.
pub const VISION_OFFSETS: [(i32, i32); 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Vision cell index of the agent itself.
pub const CENTER_INDEX: usize = 4;

/// One turn's 3x3 perception grid.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VisionGrid {
    cells: [Option<TileKind>; 9],
}

impl VisionGrid {
    /// Decode raw wire tile codes. Short or overlong inputs are tolerated:
    /// extra codes are ignored, missing cells stay unknown.
    pub fn from_codes(codes: &[i32]) -> Self {
        let mut cells = [None; 9];
        for (cell, &code) in cells.iter_mut().zip(codes.iter()) {
            *cell = TileKind::from_code(code);
        }
        Self { cells }
    }

    pub fn from_tiles(cells: [Option<TileKind>; 9]) -> Self {
        Self { cells }
    }

    #[inline]
    pub fn tile(&self, index: usize) -> Option<TileKind> {
        self.cells.get(index).copied().flatten()
    }

    /// Iterate over all nine cells as (offset, tile); unseen cells yield
    /// `None` tiles.
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), Option<TileKind>)> + '_ {
        VISION_OFFSETS
            .iter()
            .zip(self.cells.iter())
            .map(|(&offset, &tile)| (offset, tile))
    }

    /// Vision index of the cell directly ahead in `dir`.
    #[inline]
    pub fn front_index(dir: Direction) -> usize {
        match dir {
            Direction::Up => 1,
            Direction::Left => 3,
            Direction::Right => 5,
            Direction::Down => 7,
        }
    }

    /// Vision indices of the two forward diagonals relative to `dir`.
    #[inline]
    pub fn forward_diagonals(dir: Direction) -> [usize; 2] {
        match dir {
            Direction::Up => [0, 2],
            Direction::Right => [2, 8],
            Direction::Down => [6, 8],
            Direction::Left => [0, 6],
        }
    }

    /// Tile directly ahead in `dir`.
    #[inline]
    pub fn front(&self, dir: Direction) -> Option<TileKind> {
        self.tile(Self::front_index(dir))
    }

    /// Relative coordinates (from `position`) of every enemy visible in
    /// this snapshot, excluding the center cell.
    pub fn enemy_coords(&self, position: Coord) -> Vec<Coord> {
        self.iter()
            .enumerate()
            .filter(|&(index, (_, tile))| index != CENTER_INDEX && tile == Some(TileKind::Enemy))
            .map(|(_, ((dx, dy), _))| position.offset(dx, dy))
            .collect()
    }

    /// Relative coordinates of every cell the snapshot actually reports.
    pub fn visible_coords(&self, position: Coord) -> Vec<Coord> {
        self.iter()
            .filter(|&(_, tile)| tile.is_some())
            .map(|((dx, dy), _)| position.offset(dx, dy))
            .collect()
    }
}
