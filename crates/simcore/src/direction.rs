//! Cardinal directions of the maze grid.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// 90 degrees clockwise.
    pub fn right(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    /// 90 degrees counter-clockwise.
    pub fn left(self) -> Direction {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    pub fn opposite(self) -> Direction {
        self.right().right()
    }

    /// Heading of this direction in radians, counter-clockwise from north.
    pub fn heading(self) -> f64 {
        match self {
            Direction::North => 0.0,
            Direction::West => FRAC_PI_2,
            Direction::South => PI,
            Direction::East => 3.0 * FRAC_PI_2,
        }
    }

    /// Snap a continuous heading to the nearest cardinal direction.
    pub fn from_heading(heading: f64) -> Direction {
        let quarter = (heading.rem_euclid(std::f64::consts::TAU) / FRAC_PI_2).round() as i64;
        match quarter.rem_euclid(4) {
            0 => Direction::North,
            1 => Direction::West,
            2 => Direction::South,
            _ => Direction::East,
        }
    }

    /// Grid offset of the neighbouring cell in this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        };
        f.write_str(name)
    }
}
