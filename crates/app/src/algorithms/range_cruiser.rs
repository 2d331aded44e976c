use std::time::Duration;

use control::{ControlInterface, InterfaceError, MouseAlgorithm};
use simcore::InterfaceMode;

/// Front distance below which the cruiser stops and turns (m).
const BLOCKED_DISTANCE: f64 = 0.06;

/// Steering gain on the left/right range difference (rad/s per m).
const STEER_GAIN: f64 = 40.0;

/// Drives the continuous interface on range-sensor feedback: centre between
/// the side walls while the way ahead is open, spin toward the more open
/// side when it is not.
pub struct RangeCruiser {
    duration: Duration,
    speed: f64,
}

impl RangeCruiser {
    pub fn new(seconds: f64, speed: f64) -> Self {
        RangeCruiser {
            duration: Duration::from_secs_f64(seconds.max(0.0)),
            speed,
        }
    }

    /// Wheel speeds (left, right) for one set of range readings.
    pub fn command(&self, front: f64, left: f64, right: f64) -> (f64, f64) {
        if front < BLOCKED_DISTANCE {
            let spin = 0.5 * self.speed;
            return if left > right { (-spin, spin) } else { (spin, -spin) };
        }
        // More room on the left turns left (counter-clockwise)
        let steer = STEER_GAIN * (left - right);
        (self.speed - steer, self.speed + steer)
    }
}

impl MouseAlgorithm for RangeCruiser {
    fn name(&self) -> &str {
        "range_cruiser"
    }

    fn interface_mode(&self) -> InterfaceMode {
        InterfaceMode::Continuous
    }

    fn solve(&mut self, mouse: &ControlInterface) -> Result<(), InterfaceError> {
        let deadline = mouse.elapsed() + self.duration;

        while mouse.elapsed() < deadline {
            if mouse.reset_requested() {
                mouse.reset_position();
                mouse.reset_honored();
            }
            if mouse.undo_requested() {
                log::debug!("undo has no meaning while cruising, ignoring");
                mouse.undo_honored();
            }

            let front = mouse.read("front")?;
            let left = mouse.read("left")?;
            let right = mouse.read("right")?;
            let (l, r) = self.command(front, left, right);
            mouse.set_wheel_speeds(l, r)?;
        }

        mouse.set_wheel_speeds(0.0, 0.0)?;
        log::info!("cruise finished, {} late sensor reads", mouse.late_reads());
        Ok(())
    }
}
