//! Hex board geometry with offset (row, column) coordinates
//!
//! Rows are laid out in a zig-zag: odd rows sit half a tile to the right of
//! even rows, and two rows apart vertically share a column. A tile therefore
//! touches the tiles two rows above and below it, plus four diagonal
//! neighbors one row away whose column depends on the row parity.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{FishError, Result};

/// Fewest fish a tile may carry
pub const MIN_FISH: u8 = 1;

/// Most fish a tile may carry
pub const MAX_FISH: u8 = 5;

// ============================================================================
// POSITION & DIRECTION
// ============================================================================

/// Offset hex coordinates
///
/// Ordering is row-major, which is also the tie-break order for placements
/// and searched moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    fn is_odd_row(&self) -> bool {
        self.row % 2 == 1
    }

    /// Neighbor in `direction`, ignoring board bounds other than the
    /// top and left edges
    pub fn step(&self, direction: Direction) -> Option<Position> {
        let odd = self.is_odd_row();
        let (row, col) = match direction {
            Direction::North => (self.row.checked_sub(2)?, self.col),
            Direction::South => (self.row + 2, self.col),
            Direction::NorthEast => {
                let col = if odd { self.col + 1 } else { self.col };
                (self.row.checked_sub(1)?, col)
            }
            Direction::SouthEast => {
                let col = if odd { self.col + 1 } else { self.col };
                (self.row + 1, col)
            }
            Direction::SouthWest => {
                let col = if odd { self.col } else { self.col.checked_sub(1)? };
                (self.row + 1, col)
            }
            Direction::NorthWest => {
                let col = if odd { self.col } else { self.col.checked_sub(1)? };
                (self.row.checked_sub(1)?, col)
            }
        };
        Some(Position::new(row, col))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Position::new(row, col)
    }
}

/// The six straight-line directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    SouthEast = 2,
    South = 3,
    SouthWest = 4,
    NorthWest = 5,
}

impl Direction {
    /// All directions, clockwise from north
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    pub fn opposite(self) -> Self {
        Direction::ALL[(self as usize + 3) % 6]
    }
}

// ============================================================================
// TILES
// ============================================================================

/// A board cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// A tile carrying this many fish
    Fish(u8),
    /// An impassable gap
    Hole,
}

impl Tile {
    pub fn is_hole(&self) -> bool {
        matches!(self, Tile::Hole)
    }

    /// Fish on this cell (0 for a hole)
    pub fn fish(&self) -> u8 {
        match self {
            Tile::Fish(n) => *n,
            Tile::Hole => 0,
        }
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// Neighbors of one cell, indexed by `Direction as usize`
type Neighbors = [Option<Position>; 6];

/// Rectangular hex board
///
/// The shape never changes after construction; tiles only ever turn into
/// holes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardCells", into = "BoardCells")]
pub struct Board {
    rows: usize,
    cols: usize,
    /// Row-major cells
    tiles: Vec<Tile>,
    /// Row-major adjacency, computed once
    neighbors: Vec<Neighbors>,
}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Build a board from a total map of positions to tiles
    ///
    /// The dimensions are inferred from the largest coordinates present, and
    /// every position of the resulting rectangle must be mapped.
    pub fn build(tiles: FxHashMap<Position, Tile>) -> Result<Self> {
        if tiles.is_empty() {
            return Err(FishError::MalformedBoard("no tiles given".into()));
        }

        let rows = tiles.keys().map(|p| p.row).max().and_then(|r| r.checked_add(1));
        let cols = tiles.keys().map(|p| p.col).max().and_then(|c| c.checked_add(1));
        let (rows, cols) = match (rows, cols) {
            (Some(rows), Some(cols)) => (rows, cols),
            _ => return Err(FishError::MalformedBoard("coordinates out of range".into())),
        };
        if rows.checked_mul(cols) != Some(tiles.len()) {
            return Err(FishError::MalformedBoard(format!(
                "{} tiles cannot fill a {rows}x{cols} board",
                tiles.len()
            )));
        }

        let mut cells = Vec::with_capacity(tiles.len());
        for row in 0..rows {
            for col in 0..cols {
                let pos = Position::new(row, col);
                match tiles.get(&pos) {
                    Some(&tile) => cells.push(validate_tile(pos, tile)?),
                    None => {
                        return Err(FishError::MalformedBoard(format!(
                            "missing tile at {pos} in a {rows}x{cols} board"
                        )))
                    }
                }
            }
        }

        Ok(Self::from_cells(rows, cols, cells))
    }

    /// Board where every cell carries `fish_per_tile` fish
    pub fn homogeneous(fish_per_tile: u8, rows: usize, cols: usize) -> Result<Self> {
        if !(MIN_FISH..=MAX_FISH).contains(&fish_per_tile) {
            return Err(FishError::InvalidParameter(format!(
                "fish per tile must be in {MIN_FISH}..={MAX_FISH}, got {fish_per_tile}"
            )));
        }
        if rows == 0 || cols == 0 {
            return Err(FishError::InvalidParameter(format!(
                "board dimensions must be positive, got {rows}x{cols}"
            )));
        }

        let cells = rows
            .checked_mul(cols)
            .ok_or_else(|| FishError::InvalidParameter(format!("{rows}x{cols} board is too large")))?;
        Ok(Self::from_cells(rows, cols, vec![Tile::Fish(fish_per_tile); cells]))
    }

    /// Board from rows of fish counts, where 0 marks a hole
    ///
    /// Rows shorter than the longest one are padded with holes.
    pub fn from_fish_counts(counts: &[Vec<u8>]) -> Result<Self> {
        let rows = counts.len();
        let cols = counts.iter().map(Vec::len).max().unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(FishError::MalformedBoard("no tiles given".into()));
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for (row, line) in counts.iter().enumerate() {
            for col in 0..cols {
                let tile = match line.get(col).copied().unwrap_or(0) {
                    0 => Tile::Hole,
                    n => Tile::Fish(n),
                };
                cells.push(validate_tile(Position::new(row, col), tile)?);
            }
        }

        Ok(Self::from_cells(rows, cols, cells))
    }

    fn from_cells(rows: usize, cols: usize, tiles: Vec<Tile>) -> Self {
        let mut neighbors = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let pos = Position::new(row, col);
                let mut adjacent: Neighbors = [None; 6];
                for dir in Direction::ALL {
                    adjacent[dir as usize] = pos
                        .step(dir)
                        .filter(|next| next.row < rows && next.col < cols);
                }
                neighbors.push(adjacent);
            }
        }

        Self {
            rows,
            cols,
            tiles,
            neighbors,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Check if a position lies on the board
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    fn index(&self, pos: Position) -> Result<usize> {
        if self.contains(pos) {
            Ok(pos.row * self.cols + pos.col)
        } else {
            Err(FishError::OutOfBounds(pos))
        }
    }

    /// Get the tile at a position
    pub fn tile(&self, pos: Position) -> Result<Tile> {
        Ok(self.tiles[self.index(pos)?])
    }

    /// Fish at a position (0 for holes)
    pub fn fish_at(&self, pos: Position) -> Result<u8> {
        self.tile(pos).map(|t| t.fish())
    }

    /// True if the position is on the board and not a hole
    pub fn is_fish_tile(&self, pos: Position) -> bool {
        matches!(self.tile(pos), Ok(Tile::Fish(_)))
    }

    /// All positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Position::new(row, col)))
    }

    /// Number of cells that are not holes
    pub fn open_tile_count(&self) -> usize {
        self.tiles.iter().filter(|t| !t.is_hole()).count()
    }

    /// Sum of fish over the whole board
    pub fn total_fish(&self) -> u32 {
        self.tiles.iter().map(|t| t.fish() as u32).sum()
    }

    /// Neighbor of `pos` in `direction`, if it lies on the board
    pub fn neighbor(&self, pos: Position, direction: Direction) -> Result<Option<Position>> {
        Ok(self.neighbors[self.index(pos)?][direction as usize])
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    /// Turn a fish tile into a hole
    pub fn remove_tile(&mut self, pos: Position) -> Result<()> {
        let idx = self.index(pos)?;
        if self.tiles[idx].is_hole() {
            return Err(FishError::NoSuchTile(pos));
        }
        self.tiles[idx] = Tile::Hole;
        Ok(())
    }

    // ========================================================================
    // REACHABILITY
    // ========================================================================

    /// Walk from `pos` in `direction` over fish tiles only
    ///
    /// The walk excludes `pos` itself and stops before the first hole or at
    /// the board edge.
    pub fn ray(&self, pos: Position, direction: Direction) -> Ray<'_> {
        Ray {
            board: self,
            current: Some(pos),
            direction,
        }
    }

    /// Every position reachable from `pos` along an unbroken straight line of
    /// fish tiles, grouped by direction and ordered by distance
    pub fn reachable_positions(&self, pos: Position) -> Result<Vec<Position>> {
        self.index(pos)?;
        Ok(Direction::ALL
            .iter()
            .flat_map(|&dir| self.ray(pos, dir))
            .collect())
    }

    /// Cells strictly between `from` and `to` on the straight line joining
    /// them, or nothing if they do not share a line
    ///
    /// Holes are walked over here; callers decide whether they block.
    pub fn connecting_positions(&self, from: Position, to: Position) -> Vec<Position> {
        if from == to || !self.contains(from) || !self.contains(to) {
            return Vec::new();
        }

        for dir in Direction::ALL {
            let mut between = Vec::new();
            let mut current = from;
            while let Some(next) = self.neighbors[current.row * self.cols + current.col][dir as usize] {
                if next == to {
                    return between;
                }
                between.push(next);
                current = next;
            }
        }

        Vec::new()
    }
}

/// Iterator over a straight line of fish tiles, see [`Board::ray`]
pub struct Ray<'a> {
    board: &'a Board,
    current: Option<Position>,
    direction: Direction,
}

impl Iterator for Ray<'_> {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        let pos = self.current?;
        let next = self
            .board
            .neighbor(pos, self.direction)
            .ok()
            .flatten()
            .filter(|&p| self.board.is_fish_tile(p));
        self.current = next;
        next
    }
}

fn validate_tile(pos: Position, tile: Tile) -> Result<Tile> {
    match tile {
        Tile::Fish(n) if !(MIN_FISH..=MAX_FISH).contains(&n) => Err(FishError::MalformedBoard(
            format!("tile at {pos} has {n} fish, expected {MIN_FISH}..={MAX_FISH}"),
        )),
        _ => Ok(tile),
    }
}

/// Serialized form of a [`Board`]; adjacency is rebuilt on decode
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCells {
    pub rows: usize,
    pub cols: usize,
    /// Row-major cells
    pub tiles: Vec<Tile>,
}

impl From<Board> for BoardCells {
    fn from(board: Board) -> Self {
        Self {
            rows: board.rows,
            cols: board.cols,
            tiles: board.tiles,
        }
    }
}

impl TryFrom<BoardCells> for Board {
    type Error = FishError;

    fn try_from(cells: BoardCells) -> Result<Self> {
        let BoardCells { rows, cols, tiles } = cells;
        if rows == 0 || cols == 0 || rows.checked_mul(cols) != Some(tiles.len()) {
            return Err(FishError::MalformedBoard(format!(
                "{} tiles cannot fill a {rows}x{cols} board",
                tiles.len()
            )));
        }
        for (idx, &tile) in tiles.iter().enumerate() {
            validate_tile(Position::new(idx / cols, idx % cols), tile)?;
        }
        Ok(Self::from_cells(rows, cols, tiles))
    }
}
