use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::direction::Direction;

// Kinematic State

/// Continuous pose of the robot in the maze frame.
///
/// `position` is in meters with x pointing east and y pointing north.
/// `heading` is in radians, counter-clockwise from north, so north is 0,
/// west is pi/2, south is pi and east is 3pi/2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector2<f64>,
    pub heading: f64,
}

impl Default for Pose {
    fn default() -> Self {
        Pose {
            position: Vector2::zeros(),
            heading: 0.0,
        }
    }
}

impl Pose {
    pub fn new(position: Vector2<f64>, heading: f64) -> Self {
        Pose { position, heading }
    }

    /// Unit vector pointing along the heading.
    pub fn forward(&self) -> Vector2<f64> {
        heading_vector(self.heading)
    }

    /// The heading wrapped into [0, 2pi).
    pub fn normalized_heading(&self) -> f64 {
        normalize_angle(self.heading)
    }

    /// Nearest cardinal direction to the continuous heading.
    pub fn cardinal(&self) -> Direction {
        Direction::from_heading(self.heading)
    }
}

/// Unit vector for a heading measured counter-clockwise from north.
pub fn heading_vector(heading: f64) -> Vector2<f64> {
    Vector2::new(-heading.sin(), heading.cos())
}

pub fn normalize_angle(angle: f64) -> f64 {
    angle.rem_euclid(std::f64::consts::TAU)
}

/// Wheel angular velocities in rad/s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelSpeeds {
    pub left: f64,
    pub right: f64,
}

impl WheelSpeeds {
    pub fn new(left: f64, right: f64) -> Self {
        WheelSpeeds { left, right }
    }

    pub fn stopped() -> Self {
        Self::default()
    }
}

/// Body-frame velocity produced by the drivetrain.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Twist {
    /// Forward speed along the heading (m/s)
    pub linear: f64,
    /// Yaw rate, counter-clockwise positive (rad/s)
    pub angular: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyState {
    pub pose: Pose,
    pub wheels: WheelSpeeds,
}

// General Traits

#[derive(Debug, Clone, Copy)]
pub struct SimContext {
    pub dt: f64,
    pub t: f64,
}

pub trait Model {
    fn reset(&mut self);
}

pub trait MechanicsModel: Model {
    fn step_physics(&mut self, ctx: SimContext, state: &mut BodyState);
}
