//! Headless text renderer
//!
//! Stands in for a graphical view: draws the maze as ASCII with the robot
//! and its visited cells, plus a one-line status summary.

use std::collections::HashSet;
use std::fmt::Write;
use std::sync::Arc;

use mechanics::{Cell, CellGeometry, Maze, RobotSnapshot};
use nalgebra::Vector2;
use simcore::Direction;

pub struct TextRenderer {
    maze: Arc<dyn Maze>,
    geometry: CellGeometry,
}

impl TextRenderer {
    pub fn new(maze: Arc<dyn Maze>, geometry: CellGeometry) -> Self {
        TextRenderer { maze, geometry }
    }

    pub fn status_line(&self, snapshot: &RobotSnapshot, elapsed: f64) -> String {
        format!(
            "t={:.2}s cell ({}, {}) facing {} pose ({:.3}, {:.3}, {:.1} deg) wheels ({:.1}, {:.1}) rad/s",
            elapsed,
            snapshot.cell.x,
            snapshot.cell.y,
            snapshot.heading,
            snapshot.pose.position.x,
            snapshot.pose.position.y,
            snapshot.pose.normalized_heading().to_degrees(),
            snapshot.wheels.left,
            snapshot.wheels.right
        )
    }

    /// Maze drawing, north at the top.
    pub fn render(&self, snapshot: &RobotSnapshot) -> String {
        let maze = self.maze.as_ref();
        let visited: HashSet<Cell> = snapshot
            .history
            .iter()
            .map(|s| self.geometry.cell_at(Vector2::new(s.x, s.y)))
            .collect();

        let mut out = String::new();
        for y in (0..maze.height()).rev() {
            for x in 0..maze.width() {
                let wall = maze.is_wall(Cell::new(x, y), Direction::North);
                out.push('+');
                out.push_str(if wall { "---" } else { "   " });
            }
            out.push_str("+\n");

            for x in 0..maze.width() {
                let cell = Cell::new(x, y);
                out.push(if maze.is_wall(cell, Direction::West) { '|' } else { ' ' });
                let marker = if cell == snapshot.cell {
                    arrow(snapshot.heading)
                } else if visited.contains(&cell) {
                    '.'
                } else {
                    ' '
                };
                let _ = write!(out, " {} ", marker);
            }
            let last = Cell::new(maze.width() - 1, y);
            out.push(if maze.is_wall(last, Direction::East) { '|' } else { ' ' });
            out.push('\n');
        }
        for x in 0..maze.width() {
            let wall = maze.is_wall(Cell::new(x, 0), Direction::South);
            out.push('+');
            out.push_str(if wall { "---" } else { "   " });
        }
        out.push('+');
        out
    }
}

fn arrow(heading: Direction) -> char {
    match heading {
        Direction::North => '^',
        Direction::East => '>',
        Direction::South => 'v',
        Direction::West => '<',
    }
}
