//! Maze wall queries
//!
//! The simulator only ever asks one question of a maze: is there a wall on
//! side S of cell (x, y)? [`Maze`] is that seam; [`GridMaze`] is the
//! in-memory implementation used by the app and the tests.

use serde::{Deserialize, Serialize};
use simcore::Direction;

/// Discretized cell coordinates. (0, 0) is the south-west corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    pub fn neighbor(self, direction: Direction) -> Cell {
        let (dx, dy) = direction.offset();
        Cell::new(self.x + dx, self.y + dy)
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Cell::new(x, y)
    }
}

/// Static wall-adjacency structure, immutable for the run.
pub trait Maze: Send + Sync {
    fn width(&self) -> i32;

    fn height(&self) -> i32;

    /// Whether a wall blocks `direction` out of `cell`. Cells outside the
    /// maze report every side walled.
    fn is_wall(&self, cell: Cell, direction: Direction) -> bool;

    fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width() && cell.y < self.height()
    }
}

/// One wall segment, addressed by the cell it borders and the side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallSegment {
    pub x: i32,
    pub y: i32,
    pub side: Direction,
}

/// Rectangular maze with a closed outer border.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridMaze {
    width: i32,
    height: i32,
    /// Per cell, indexed by `Direction::index`
    walls: Vec<[bool; 4]>,
}

impl GridMaze {
    /// An open maze of the given size, walled only along its border.
    pub fn bordered(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut maze = GridMaze {
            width,
            height,
            walls: vec![[false; 4]; (width * height) as usize],
        };

        for x in 0..width {
            maze.set_wall(Cell::new(x, 0), Direction::South, true);
            maze.set_wall(Cell::new(x, height - 1), Direction::North, true);
        }
        for y in 0..height {
            maze.set_wall(Cell::new(0, y), Direction::West, true);
            maze.set_wall(Cell::new(width - 1, y), Direction::East, true);
        }
        maze
    }

    pub fn from_walls(width: i32, height: i32, walls: &[WallSegment]) -> Self {
        let mut maze = Self::bordered(width, height);
        for wall in walls {
            maze.set_wall(Cell::new(wall.x, wall.y), wall.side, true);
        }
        maze
    }

    /// Builder form of [`GridMaze::set_wall`].
    pub fn with_wall(mut self, cell: Cell, side: Direction) -> Self {
        self.set_wall(cell, side, true);
        self
    }

    /// Set or clear a wall. The neighbouring cell's opposite side is kept in
    /// sync, so a wall is always seen from both cells it separates.
    pub fn set_wall(&mut self, cell: Cell, side: Direction, present: bool) {
        if let Some(i) = self.index(cell) {
            self.walls[i][side.index()] = present;
        }
        if let Some(i) = self.index(cell.neighbor(side)) {
            self.walls[i][side.opposite().index()] = present;
        }
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        self.contains(cell)
            .then(|| (cell.y * self.width + cell.x) as usize)
    }
}

impl Maze for GridMaze {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn is_wall(&self, cell: Cell, direction: Direction) -> bool {
        match self.index(cell) {
            Some(i) => self.walls[i][direction.index()],
            None => true,
        }
    }
}
