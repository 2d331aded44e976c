//! Robot sensors
//!
//! Each named sensor pairs a declared read latency with a measurement
//! function. The latency is not charged here; the control interface uses it
//! to detect late reads.

use std::time::Duration;

use rand_distr::{Distribution, Normal};
use simcore::{Direction, Pose, SensorConfig, heading_vector};

use crate::geometry::CellGeometry;
use crate::maze::Maze;

/// A measurement taken from the current pose.
pub trait Measurement: Send + Sync {
    fn measure(&self, pose: &Pose, maze: &dyn Maze, geometry: &CellGeometry) -> f64;
}

impl<F> Measurement for F
where
    F: Fn(&Pose, &dyn Maze, &CellGeometry) -> f64 + Send + Sync,
{
    fn measure(&self, pose: &Pose, maze: &dyn Maze, geometry: &CellGeometry) -> f64 {
        self(pose, maze, geometry)
    }
}

pub struct Sensor {
    pub read_latency: Duration,
    measurement: Box<dyn Measurement>,
}

impl Sensor {
    pub fn new(read_latency: Duration, measurement: impl Measurement + 'static) -> Self {
        Sensor {
            read_latency,
            measurement: Box::new(measurement),
        }
    }

    pub fn from_config(config: &SensorConfig) -> Self {
        Self::new(config.read_latency(), RangeSensor::from_config(config))
    }

    pub fn measure(&self, pose: &Pose, maze: &dyn Maze, geometry: &CellGeometry) -> f64 {
        self.measurement.measure(pose, maze, geometry)
    }
}

/// Value returned by a sensor read, with the latency the sensor declares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub value: f64,
    pub read_latency: Duration,
}

/// Distance to the nearest wall face along a ray fixed to the robot body.
#[derive(Debug, Clone)]
pub struct RangeSensor {
    /// Mounting angle relative to the heading, counter-clockwise positive (rad)
    pub angle: f64,
    /// Maximum distance reported (m)
    pub range: f64,
    noise: Option<Normal<f64>>,
}

impl RangeSensor {
    pub fn new(angle: f64, range: f64) -> Self {
        RangeSensor {
            angle,
            range,
            noise: None,
        }
    }

    /// Additive Gaussian noise. A non-positive or invalid standard deviation
    /// disables noise.
    pub fn with_noise(mut self, std_dev: f64) -> Self {
        self.noise = if std_dev > 0.0 {
            Normal::new(0.0, std_dev).ok()
        } else {
            None
        };
        self
    }

    pub fn from_config(config: &SensorConfig) -> Self {
        RangeSensor::new(config.angle_deg.to_radians(), config.range).with_noise(config.noise_std_dev)
    }

    /// Noise-free distance along the ray, capped at the sensor range.
    pub fn cast(&self, pose: &Pose, maze: &dyn Maze, geometry: &CellGeometry) -> f64 {
        let origin = pose.position;
        let dir = heading_vector(pose.heading + self.angle);
        let pitch = geometry.pitch();
        let margin = 0.5 * geometry.wall_width;
        let mut cell = geometry.cell_at(origin);

        // Grid traversal: distance along the ray to the next x and y boundary
        let axis = |o: f64, d: f64, index: i32| -> (f64, f64) {
            if d > 1e-12 {
                (((index + 1) as f64 * pitch - o) / d, pitch / d)
            } else if d < -1e-12 {
                ((index as f64 * pitch - o) / d, -pitch / d)
            } else {
                (f64::INFINITY, f64::INFINITY)
            }
        };
        let (mut next_x, delta_x) = axis(origin.x, dir.x, cell.x);
        let (mut next_y, delta_y) = axis(origin.y, dir.y, cell.y);

        let side_x = if dir.x > 0.0 { Direction::East } else { Direction::West };
        let side_y = if dir.y > 0.0 { Direction::North } else { Direction::South };

        loop {
            let (t, side, component) = if next_x < next_y {
                (next_x, side_x, dir.x)
            } else {
                (next_y, side_y, dir.y)
            };
            if t.is_nan() || t > self.range {
                return self.range;
            }
            if maze.is_wall(cell, side) {
                let face = t - margin / component.abs();
                return face.clamp(0.0, self.range);
            }
            cell = cell.neighbor(side);
            if next_x < next_y {
                next_x += delta_x;
            } else {
                next_y += delta_y;
            }
        }
    }
}

impl Measurement for RangeSensor {
    fn measure(&self, pose: &Pose, maze: &dyn Maze, geometry: &CellGeometry) -> f64 {
        let distance = self.cast(pose, maze, geometry);
        match &self.noise {
            Some(noise) => {
                let sample = noise.sample(&mut rand::thread_rng());
                (distance + sample).clamp(0.0, self.range)
            }
            None => distance,
        }
    }
}
