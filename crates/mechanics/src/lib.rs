//! Robot mechanics and the physics engine
//!
//! This crate provides:
//! - The maze wall-query seam and an in-memory grid maze
//! - Cell geometry and the differential drivetrain
//! - Wall collision clamping and range sensors
//! - The shared robot model with its pose history
//! - Motion strategies and the fixed-rate physics engine

pub mod collision;
pub mod drive;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod maze;
pub mod motion;
pub mod robot;
pub mod sensor;

pub use collision::clamp_translation;
pub use drive::{DifferentialDrive, DifferentialDriveConfig};
pub use engine::{EngineError, EngineState, PhysicsEngine};
pub use geometry::CellGeometry;
pub use history::{PoseHistory, PoseSample};
pub use maze::{Cell, GridMaze, Maze, WallSegment};
pub use motion::{Idle, MotionStrategy, ScriptedMotion, WheelIntegration, strategy_for};
pub use robot::{Robot, RobotError, RobotSnapshot, PendingReading, SharedRobot, lock_read, lock_write};
pub use sensor::{Measurement, RangeSensor, Sensor, SensorReading};
