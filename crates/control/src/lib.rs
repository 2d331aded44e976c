//! Control interface for maze algorithms
//!
//! This crate provides:
//! - The control interface with its one-time mode declaration
//! - Discrete (cell-stepping) and continuous (wheel speed) drivers
//! - The `MouseAlgorithm` trait third-party navigation code implements

pub mod algorithm;
pub mod continuous;
pub mod discrete;
pub mod error;
pub mod interface;

pub use algorithm::{MouseAlgorithm, run_algorithm};
pub use continuous::{ContinuousDriver, TimedRead};
pub use discrete::{DiscreteDriver, MOTION_STEPS, STEP_PAUSE};
pub use error::InterfaceError;
pub use interface::ControlInterface;
