use nalgebra::Vector2;
use simcore::SimConfig;

use crate::maze::Cell;

/// Physical size of the maze grid. The cell pitch is one wall length plus
/// one wall width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellGeometry {
    pub wall_length: f64,
    pub wall_width: f64,
}

impl CellGeometry {
    pub fn new(wall_length: f64, wall_width: f64) -> Self {
        CellGeometry { wall_length, wall_width }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.wall_length, config.wall_width)
    }

    pub fn pitch(&self) -> f64 {
        self.wall_length + self.wall_width
    }

    /// Cell containing a continuous position: floor(position / pitch).
    pub fn cell_at(&self, position: Vector2<f64>) -> Cell {
        let pitch = self.pitch();
        Cell::new(
            (position.x / pitch).floor() as i32,
            (position.y / pitch).floor() as i32,
        )
    }

    pub fn center_of(&self, cell: Cell) -> Vector2<f64> {
        let pitch = self.pitch();
        Vector2::new(
            (cell.x as f64 + 0.5) * pitch,
            (cell.y as f64 + 0.5) * pitch,
        )
    }

    /// South-west and north-east corners of a cell.
    pub fn bounds(&self, cell: Cell) -> (Vector2<f64>, Vector2<f64>) {
        let pitch = self.pitch();
        let min = Vector2::new(cell.x as f64 * pitch, cell.y as f64 * pitch);
        (min, min + Vector2::new(pitch, pitch))
    }
}

impl Default for CellGeometry {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}
