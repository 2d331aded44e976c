//! Discrete driver
//!
//! Cell-granular commands. Motion is scripted: the pose is interpolated from
//! the current cell center in fixed fractional steps with a short paced wait
//! after each one, so an algorithm cannot move faster than the animation.
//! The physics engine does not integrate wheel speeds in this mode.

use std::f64::consts::FRAC_PI_2;
use std::time::Duration;

use mechanics::{SharedRobot, lock_read, lock_write};
use nalgebra::Vector2;
use simcore::{Direction, Shutdown, normalize_angle};

use crate::error::InterfaceError;

/// Interpolation steps per scripted motion.
pub const MOTION_STEPS: u32 = 100;

/// Paced wait after each interpolation step.
pub const STEP_PAUSE: Duration = Duration::from_millis(1);

pub struct DiscreteDriver {
    robot: SharedRobot,
    shutdown: Shutdown,
}

impl DiscreteDriver {
    pub fn new(robot: SharedRobot, shutdown: Shutdown) -> Self {
        DiscreteDriver { robot, shutdown }
    }

    pub fn heading(&self) -> Direction {
        lock_read(&self.robot).discretized_heading()
    }

    /// Wall on the given side, relative to the current heading.
    fn wall_toward(&self, turn: fn(Direction) -> Direction) -> bool {
        let robot = lock_read(&self.robot);
        robot.wall_present(turn(robot.discretized_heading()))
    }

    pub fn wall_front(&self) -> bool {
        self.wall_toward(|d| d)
    }

    pub fn wall_right(&self) -> bool {
        self.wall_toward(Direction::right)
    }

    pub fn wall_left(&self) -> bool {
        self.wall_toward(Direction::left)
    }

    /// Move one cell along the heading. A wall in front refuses the move and
    /// the robot stays where it is.
    pub fn move_forward(&self) -> Result<(), InterfaceError> {
        let (start, end, yaw) = {
            let robot = lock_read(&self.robot);
            let cell = robot.discretized_cell();
            let heading = robot.discretized_heading();
            if robot.wall_present(heading) {
                log::warn!(
                    "move forward refused: wall {} of cell ({}, {})",
                    heading,
                    cell.x,
                    cell.y
                );
                return Ok(());
            }
            let geometry = robot.geometry();
            (
                geometry.center_of(cell),
                geometry.center_of(cell.neighbor(heading)),
                heading.heading(),
            )
        };

        log::debug!("moving forward to ({:.3}, {:.3})", end.x, end.y);
        self.animate(|f| (start + (end - start) * f, yaw))
    }

    /// Rotate 90 degrees clockwise in place.
    pub fn turn_right(&self) -> Result<(), InterfaceError> {
        self.turn(-FRAC_PI_2)
    }

    /// Rotate 90 degrees counter-clockwise in place.
    pub fn turn_left(&self) -> Result<(), InterfaceError> {
        self.turn(FRAC_PI_2)
    }

    pub fn turn_around(&self) -> Result<(), InterfaceError> {
        self.turn_right()?;
        self.turn_right()
    }

    fn turn(&self, sweep: f64) -> Result<(), InterfaceError> {
        let (center, from) = {
            let robot = lock_read(&self.robot);
            let cell = robot.discretized_cell();
            (robot.geometry().center_of(cell), robot.discretized_heading().heading())
        };

        log::debug!("turning {:.0} degrees", sweep.to_degrees());
        self.animate(|f| (center, normalize_angle(from + sweep * f)))
    }

    /// Teleport through `MOTION_STEPS` poses, the last at fraction 1.0.
    ///
    /// On shutdown the final pose is applied at once and the motion reports
    /// `Interrupted`.
    fn animate(&self, pose_at: impl Fn(f64) -> (Vector2<f64>, f64)) -> Result<(), InterfaceError> {
        for step in 1..=MOTION_STEPS {
            let fraction = f64::from(step) / f64::from(MOTION_STEPS);
            let (position, heading) = pose_at(fraction);
            lock_write(&self.robot).teleport(position, heading);

            if !self.shutdown.sleep(STEP_PAUSE) {
                let (position, heading) = pose_at(1.0);
                lock_write(&self.robot).teleport(position, heading);
                return Err(InterfaceError::Interrupted);
            }
        }
        Ok(())
    }
}
