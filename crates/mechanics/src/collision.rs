//! Wall collision clamp
//!
//! The robot is treated as a point at its center. A walled boundary keeps
//! that point half a wall width inside the cell. Motion is resolved one axis
//! at a time (x first, then y in whatever column x ended up in), walking
//! cell by cell so fast motion cannot tunnel through a wall.

use nalgebra::Vector2;
use simcore::Direction;

use crate::geometry::CellGeometry;
use crate::maze::{Cell, Maze};

/// Clamp a translation from `from` to `to` so it does not pass through any
/// wall. Returns the resolved position; never fails.
pub fn clamp_translation(
    maze: &dyn Maze,
    geometry: &CellGeometry,
    from: Vector2<f64>,
    to: Vector2<f64>,
) -> Vector2<f64> {
    let x = clamp_axis(maze, geometry, geometry.cell_at(from), from.x, to.x, Axis::X);
    let column = geometry.cell_at(Vector2::new(x, from.y));
    let y = clamp_axis(maze, geometry, column, from.y, to.y, Axis::Y);

    let resolved = Vector2::new(x, y);
    if resolved != to {
        log::trace!(
            "clamped motion at wall: ({:.4}, {:.4}) -> ({:.4}, {:.4})",
            to.x,
            to.y,
            x,
            y
        );
    }
    resolved
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn component(self, v: Vector2<f64>) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    /// Side of the cell crossed when moving along this axis.
    fn side(self, positive: bool) -> Direction {
        match (self, positive) {
            (Axis::X, true) => Direction::East,
            (Axis::X, false) => Direction::West,
            (Axis::Y, true) => Direction::North,
            (Axis::Y, false) => Direction::South,
        }
    }
}

fn clamp_axis(
    maze: &dyn Maze,
    geometry: &CellGeometry,
    start: Cell,
    from: f64,
    to: f64,
    axis: Axis,
) -> f64 {
    let margin = 0.5 * geometry.wall_width;
    let positive = to >= from;
    let side = axis.side(positive);
    let mut cell = start;

    // Bounded by the number of cells the motion can span
    let max_cells = ((to - from).abs() / geometry.pitch()).ceil() as usize + 1;

    for _ in 0..=max_cells {
        let (min, max) = geometry.bounds(cell);
        let edge = if positive {
            axis.component(max)
        } else {
            axis.component(min)
        };
        let limit = if positive { edge - margin } else { edge + margin };

        let within_limit = if positive { to <= limit } else { to >= limit };
        if within_limit {
            return to;
        }
        if maze.is_wall(cell, side) {
            // Stop at the wall face; never push back a robot already past it
            return if positive {
                limit.max(from)
            } else {
                limit.min(from)
            };
        }
        let stays_in_cell = if positive { to < edge } else { to >= edge };
        if stays_in_cell {
            return to;
        }
        cell = cell.neighbor(side);
    }

    to
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::GridMaze;
    use approx::assert_abs_diff_eq;

    fn geometry() -> CellGeometry {
        CellGeometry::new(0.9, 0.1)
    }

    #[test]
    fn test_open_motion_is_unchanged() {
        let maze = GridMaze::bordered(3, 3);
        let from = Vector2::new(0.5, 0.5);
        let to = Vector2::new(1.4, 0.6);

        let resolved = clamp_translation(&maze, &geometry(), from, to);
        assert_eq!(resolved, to);
    }

    #[test]
    fn test_interior_wall_stops_motion() {
        let maze = GridMaze::bordered(3, 3).with_wall(Cell::new(0, 0), Direction::East);
        let from = Vector2::new(0.5, 0.5);
        let to = Vector2::new(1.3, 0.5);

        let resolved = clamp_translation(&maze, &geometry(), from, to);
        assert_abs_diff_eq!(resolved.x, 0.95, epsilon = 1e-12);
        assert_abs_diff_eq!(resolved.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_outer_border_contains_robot() {
        let maze = GridMaze::bordered(2, 2);
        let from = Vector2::new(0.5, 0.5);
        let to = Vector2::new(-3.0, -3.0);

        let resolved = clamp_translation(&maze, &geometry(), from, to);
        assert_abs_diff_eq!(resolved.x, 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(resolved.y, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_fast_motion_cannot_tunnel() {
        let maze = GridMaze::bordered(5, 1).with_wall(Cell::new(2, 0), Direction::East);
        let from = Vector2::new(0.5, 0.5);
        let to = Vector2::new(4.5, 0.5);

        let resolved = clamp_translation(&maze, &geometry(), from, to);
        assert_abs_diff_eq!(resolved.x, 2.95, epsilon = 1e-12);
    }

    #[test]
    fn test_sliding_along_wall_keeps_free_axis() {
        let maze = GridMaze::bordered(3, 3);
        let from = Vector2::new(0.5, 0.5);
        let to = Vector2::new(-1.0, 1.5);

        let resolved = clamp_translation(&maze, &geometry(), from, to);
        assert_abs_diff_eq!(resolved.x, 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(resolved.y, 1.5, epsilon = 1e-12);
    }
}
