//! Physics-side Motion Strategies
//!
//! What a physics tick does to the robot depends on how the algorithm drives
//! it. The strategy is picked once, when the engine first sees a declared
//! interface mode, and stays fixed for the run.

use simcore::{InterfaceMode, MechanicsModel, SimContext};

use crate::collision::clamp_translation;
use crate::drive::{DifferentialDrive, DifferentialDriveConfig};
use crate::robot::Robot;

/// Trait for per-tick motion strategies
pub trait MotionStrategy: Send {
    fn name(&self) -> &'static str;

    /// Advance the robot by one fixed tick.
    fn advance(&mut self, ctx: SimContext, robot: &mut Robot);
}

// ============================================================================
// Wheel integration (continuous mode)
// ============================================================================

/// Integrates commanded wheel speeds into the pose and clamps the result
/// against the maze walls.
#[derive(Debug, Clone)]
pub struct WheelIntegration {
    drive: DifferentialDrive,
}

impl WheelIntegration {
    pub fn new(config: DifferentialDriveConfig) -> Self {
        WheelIntegration {
            drive: DifferentialDrive::new(config),
        }
    }
}

impl MotionStrategy for WheelIntegration {
    fn name(&self) -> &'static str {
        "wheel integration"
    }

    fn advance(&mut self, ctx: SimContext, robot: &mut Robot) {
        let mut state = robot.body();
        let from = state.pose.position;

        self.drive.step_physics(ctx, &mut state);

        let resolved = clamp_translation(robot.maze(), robot.geometry(), from, state.pose.position);
        state.pose.position = resolved;
        *robot.body_mut() = state;
    }
}

// ============================================================================
// Scripted motion (discrete mode)
// ============================================================================

/// The control interface moves the robot directly; the tick leaves the pose
/// alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedMotion;

impl MotionStrategy for ScriptedMotion {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn advance(&mut self, _ctx: SimContext, _robot: &mut Robot) {}
}

// ============================================================================
// Idle (no mode declared yet)
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

impl MotionStrategy for Idle {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn advance(&mut self, _ctx: SimContext, _robot: &mut Robot) {}
}

/// Strategy for a declared interface mode.
pub fn strategy_for(mode: InterfaceMode, drive: DifferentialDriveConfig) -> Box<dyn MotionStrategy> {
    match mode {
        InterfaceMode::Continuous => Box::new(WheelIntegration::new(drive)),
        InterfaceMode::Discrete => Box::new(ScriptedMotion),
        InterfaceMode::Undeclared => Box::new(Idle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{GridMaze, Maze};
    use approx::assert_abs_diff_eq;
    use simcore::SimConfig;
    use std::sync::Arc;

    fn robot(width: i32, height: i32) -> Robot {
        let maze: Arc<dyn Maze> = Arc::new(GridMaze::bordered(width, height));
        Robot::from_config(&SimConfig::default(), maze)
    }

    fn ctx() -> SimContext {
        SimContext { dt: 1.0 / 60.0, t: 0.0 }
    }

    #[test]
    fn test_strategy_selection() {
        let drive = DifferentialDriveConfig::default();
        assert_eq!(strategy_for(InterfaceMode::Continuous, drive).name(), "wheel integration");
        assert_eq!(strategy_for(InterfaceMode::Discrete, drive).name(), "scripted");
        assert_eq!(strategy_for(InterfaceMode::Undeclared, drive).name(), "idle");
    }

    #[test]
    fn test_wheel_integration_moves_robot() {
        let mut robot = robot(1, 4);
        robot.set_wheel_speeds(10.0, 10.0);
        let mut strategy = WheelIntegration::new(DifferentialDriveConfig::default());

        strategy.advance(ctx(), &mut robot);

        // 10 rad/s * 0.02 m / 60 Hz
        let expected = 0.09 + 10.0 * 0.02 / 60.0;
        assert_abs_diff_eq!(robot.pose().position.y, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(robot.pose().position.x, 0.09, epsilon = 1e-12);
    }

    #[test]
    fn test_wheel_integration_stops_at_wall() {
        let mut robot = robot(1, 1);
        robot.set_wheel_speeds(100.0, 100.0);
        let mut strategy = WheelIntegration::new(DifferentialDriveConfig::default());

        for _ in 0..120 {
            strategy.advance(ctx(), &mut robot);
        }

        // Border at y = 0.18, half a wall width inside
        assert_abs_diff_eq!(robot.pose().position.y, 0.174, epsilon = 1e-9);
        assert_eq!(robot.discretized_cell(), crate::maze::Cell::new(0, 0));
    }

    #[test]
    fn test_wheel_integration_writes_back_clamped_speeds() {
        let mut robot = robot(2, 2);
        robot.set_wheel_speeds(f64::NAN, 1e6);
        let mut strategy = WheelIntegration::new(DifferentialDriveConfig::default());

        strategy.advance(ctx(), &mut robot);

        assert_eq!(robot.wheel_speeds().left, 0.0);
        assert_eq!(robot.wheel_speeds().right, 100.0);
    }

    #[test]
    fn test_scripted_and_idle_leave_pose() {
        let mut robot = robot(2, 2);
        robot.set_wheel_speeds(20.0, 20.0);
        let before = robot.pose();

        ScriptedMotion.advance(ctx(), &mut robot);
        Idle.advance(ctx(), &mut robot);

        assert_eq!(robot.pose(), before);
    }
}
