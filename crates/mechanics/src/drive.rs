use serde::{Deserialize, Serialize};
use simcore::{
    BodyState, ForwardEuler, Integrator, MechanicsModel, Model, SimConfig, SimContext, Twist,
    WheelSpeeds,
};

/// Represents the physical configuration of a two-wheel differential drivetrain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferentialDriveConfig {
    /// Radius of each drive wheel in meters.
    pub wheel_radius: f64,
    /// Distance between the left and right wheel contact points in meters.
    pub track_width: f64,
    /// Commanded wheel speeds are clamped to +/- this value in rad/s.
    pub max_wheel_speed: f64,
}

impl Default for DifferentialDriveConfig {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}

impl DifferentialDriveConfig {
    pub fn from_config(config: &SimConfig) -> Self {
        DifferentialDriveConfig {
            wheel_radius: config.wheel_radius,
            track_width: config.track_width,
            max_wheel_speed: config.max_wheel_speed,
        }
    }
}

/// The differential drivetrain model that turns wheel angular velocities
/// into body motion and integrates the robot pose.
#[derive(Debug, Clone)]
pub struct DifferentialDrive {
    pub config: DifferentialDriveConfig,
    integrator: ForwardEuler,
}

impl DifferentialDrive {
    pub fn new(config: DifferentialDriveConfig) -> Self {
        DifferentialDrive {
            config,
            integrator: ForwardEuler,
        }
    }

    /// Sanitize commanded wheel speeds: NaN becomes zero and magnitudes are
    /// limited to the configured maximum. Never rejects.
    pub fn clamp_wheels(&self, wheels: WheelSpeeds) -> WheelSpeeds {
        let limit = self.config.max_wheel_speed;
        let clamp = |omega: f64| {
            if omega.is_nan() {
                0.0
            } else {
                omega.clamp(-limit, limit)
            }
        };
        WheelSpeeds::new(clamp(wheels.left), clamp(wheels.right))
    }

    /// Body twist for the given wheel speeds.
    /// linear = r * (wl + wr) / 2, angular = r * (wr - wl) / track_width
    pub fn twist(&self, wheels: WheelSpeeds) -> Twist {
        let r = self.config.wheel_radius;
        let left_surface = wheels.left * r;
        let right_surface = wheels.right * r;

        Twist {
            linear: 0.5 * (left_surface + right_surface),
            angular: (right_surface - left_surface) / self.config.track_width,
        }
    }
}

impl Model for DifferentialDrive {
    fn reset(&mut self) {
        // No internal state to reset beyond config
    }
}

impl MechanicsModel for DifferentialDrive {
    fn step_physics(&mut self, ctx: SimContext, state: &mut BodyState) {
        // 1. Effective wheel speeds after clamping
        state.wheels = self.clamp_wheels(state.wheels);

        // 2. Wheel speeds -> body twist
        let twist = self.twist(state.wheels);

        // 3. Integrate pose over the fixed tick
        self.integrator.step(&ctx, &mut state.pose, twist);
    }
}
