//! Core types shared by the maze simulator crates
//!
//! This crate provides:
//! - Kinematic state (pose, wheel speeds, twist) and model traits
//! - Cardinal directions of the maze grid
//! - Pose integrators and the fixed-timestep accumulator
//! - The process clock and the cancellable shutdown signal
//! - Simulation configuration
//! - Shared control state (interface mode, undo/reset/pause flags)

pub mod clock;
pub mod config;
pub mod direction;
pub mod error;
pub mod integrators;
pub mod state;
pub mod traits;

pub use clock::{Clock, Shutdown};
pub use config::{SensorConfig, SimConfig};
pub use direction::Direction;
pub use error::{ConfigError, ModeError};
pub use integrators::{FixedTimestep, ForwardEuler, Integrator};
pub use state::{InterfaceMode, SharedControlState};
pub use traits::*;
