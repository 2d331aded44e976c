use thiserror::Error;

use crate::state::InterfaceMode;

/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("frame rate must be positive, got {0} Hz")]
    FrameRate(f64),

    #[error("{name} must be positive, got {value} m")]
    NonPositiveLength { name: &'static str, value: f64 },

    #[error("maximum wheel speed must be positive, got {0} rad/s")]
    MaxWheelSpeed(f64),

    #[error("sensor `{name}`: {reason}")]
    Sensor { name: String, reason: String },

    #[error("duplicate sensor name `{0}`")]
    DuplicateSensor(String),
}

/// Violations of the one-shot interface mode declaration.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeError {
    #[error("the interface mode may not be declared as undeclared")]
    Undeclared,

    #[error("the interface mode may only be declared once (already {current})")]
    AlreadyDeclared { current: InterfaceMode },
}
