//! The simulated mouse
//!
//! [`Robot`] holds the continuous body state (pose and wheel speeds), the
//! named sensor table and a bounded pose history. Cell and cardinal heading
//! are derived from the pose on demand.
//!
//! The robot is shared between the physics thread, the control interface and
//! the renderer as a [`SharedRobot`]. Writers hold the lock for one tick or
//! one scripted step at a time.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use nalgebra::Vector2;
use simcore::{BodyState, Direction, Pose, SimConfig, WheelSpeeds};
use thiserror::Error;

use crate::geometry::CellGeometry;
use crate::history::{PoseHistory, PoseSample};
use crate::maze::{Cell, Maze};
use crate::sensor::{Sensor, SensorReading};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RobotError {
    #[error("unknown sensor `{0}`")]
    UnknownSensor(String),
}

/// Handle type for the shared robot (Arc<RwLock<Robot>>).
pub type SharedRobot = Arc<RwLock<Robot>>;

/// Read access that survives a poisoned lock.
pub fn lock_read(robot: &SharedRobot) -> RwLockReadGuard<'_, Robot> {
    robot.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn lock_write(robot: &SharedRobot) -> RwLockWriteGuard<'_, Robot> {
    robot.write().unwrap_or_else(PoisonError::into_inner)
}

/// Copy of the robot state handed to the renderer.
#[derive(Debug, Clone)]
pub struct RobotSnapshot {
    pub pose: Pose,
    pub cell: Cell,
    pub heading: Direction,
    pub wheels: WheelSpeeds,
    pub history: Vec<PoseSample>,
}

pub struct Robot {
    body: BodyState,
    initial_pose: Pose,
    geometry: CellGeometry,
    maze: Arc<dyn Maze>,
    sensors: HashMap<String, Arc<Sensor>>,
    history: PoseHistory,
}

/// Everything a sensor needs to measure, copied out of the robot so the
/// measurement runs without holding the robot lock.
#[derive(Clone)]
pub struct PendingReading {
    sensor: Arc<Sensor>,
    pose: Pose,
    maze: Arc<dyn Maze>,
    geometry: CellGeometry,
}

impl PendingReading {
    pub fn read_latency(&self) -> Duration {
        self.sensor.read_latency
    }

    pub fn measure(&self) -> SensorReading {
        SensorReading {
            value: self.sensor.measure(&self.pose, self.maze.as_ref(), &self.geometry),
            read_latency: self.sensor.read_latency,
        }
    }
}

impl Robot {
    /// A robot with no sensors, standing at `initial_pose`.
    pub fn new(initial_pose: Pose, geometry: CellGeometry, maze: Arc<dyn Maze>) -> Self {
        Robot {
            body: BodyState {
                pose: initial_pose,
                wheels: WheelSpeeds::stopped(),
            },
            initial_pose,
            geometry,
            maze,
            sensors: HashMap::new(),
            history: PoseHistory::default(),
        }
    }

    /// A robot centered in the configured start cell, facing the configured
    /// direction, carrying the configured range sensors.
    pub fn from_config(config: &SimConfig, maze: Arc<dyn Maze>) -> Self {
        let geometry = CellGeometry::from_config(config);
        let start = geometry.center_of(Cell::from(config.initial_cell));
        let pose = Pose::new(start, config.initial_direction.heading());

        let mut robot = Robot::new(pose, geometry, maze);
        robot.history = PoseHistory::new(config.history_capacity);
        for sensor in &config.sensors {
            robot.add_sensor(sensor.name.clone(), Sensor::from_config(sensor));
        }
        robot
    }

    /// Register a sensor, replacing any sensor with the same name.
    pub fn add_sensor(&mut self, name: impl Into<String>, sensor: Sensor) {
        let name = name.into();
        if self.sensors.insert(name.clone(), Arc::new(sensor)).is_some() {
            log::debug!("replaced sensor `{}`", name);
        }
    }

    pub fn with_sensor(mut self, name: impl Into<String>, sensor: Sensor) -> Self {
        self.add_sensor(name, sensor);
        self
    }

    pub fn pose(&self) -> Pose {
        self.body.pose
    }

    pub fn wheel_speeds(&self) -> WheelSpeeds {
        self.body.wheels
    }

    pub fn body(&self) -> BodyState {
        self.body
    }

    pub fn body_mut(&mut self) -> &mut BodyState {
        &mut self.body
    }

    /// Store commanded wheel speeds. Takes effect on the next physics tick.
    pub fn set_wheel_speeds(&mut self, left: f64, right: f64) {
        self.body.wheels = WheelSpeeds::new(left, right);
    }

    /// Overwrite the continuous pose.
    pub fn teleport(&mut self, position: Vector2<f64>, heading: f64) {
        self.body.pose = Pose::new(position, heading);
    }

    /// Snapshot of the pose and sensor handle for a measurement taken
    /// after the lock is released.
    pub fn pending_reading(&self, name: &str) -> Result<PendingReading, RobotError> {
        let sensor = self
            .sensors
            .get(name)
            .ok_or_else(|| RobotError::UnknownSensor(name.to_string()))?;

        Ok(PendingReading {
            sensor: Arc::clone(sensor),
            pose: self.body.pose,
            maze: Arc::clone(&self.maze),
            geometry: self.geometry,
        })
    }

    /// Measure in place. Holding a lock across this call blocks writers for
    /// the whole measurement; use [`Robot::pending_reading`] from other threads.
    pub fn read_sensor(&self, name: &str) -> Result<SensorReading, RobotError> {
        Ok(self.pending_reading(name)?.measure())
    }

    pub fn discretized_cell(&self) -> Cell {
        self.geometry.cell_at(self.body.pose.position)
    }

    pub fn discretized_heading(&self) -> Direction {
        self.body.pose.cardinal()
    }

    /// Whether a wall borders the current cell on the given absolute side.
    pub fn wall_present(&self, direction: Direction) -> bool {
        self.maze.is_wall(self.discretized_cell(), direction)
    }

    /// Return to the initial pose with the wheels stopped.
    pub fn reset_position(&mut self) {
        self.body = BodyState {
            pose: self.initial_pose,
            wheels: WheelSpeeds::stopped(),
        };
        log::info!(
            "robot reset to ({:.3}, {:.3}) facing {}",
            self.initial_pose.position.x,
            self.initial_pose.position.y,
            self.initial_pose.cardinal()
        );
    }

    pub fn initial_pose(&self) -> Pose {
        self.initial_pose
    }

    /// Append the current pose to the history, `t` seconds into the run.
    pub fn record(&mut self, t: f64) {
        self.history.push(&self.body.pose, t);
    }

    pub fn history(&self) -> &PoseHistory {
        &self.history
    }

    pub fn geometry(&self) -> &CellGeometry {
        &self.geometry
    }

    pub fn maze(&self) -> &dyn Maze {
        self.maze.as_ref()
    }

    pub fn snapshot(&self) -> RobotSnapshot {
        RobotSnapshot {
            pose: self.body.pose,
            cell: self.discretized_cell(),
            heading: self.discretized_heading(),
            wheels: self.body.wheels,
            history: self.history.to_vec(),
        }
    }

    pub fn into_shared(self) -> SharedRobot {
        Arc::new(RwLock::new(self))
    }
}
