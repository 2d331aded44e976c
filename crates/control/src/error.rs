use mechanics::RobotError;
use simcore::{InterfaceMode, ModeError};
use thiserror::Error;

/// Errors returned to algorithm code by the control interface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterfaceError {
    #[error(transparent)]
    Mode(#[from] ModeError),
    #[error("`{operation}` is only available in the {required} interface")]
    WrongMode {
        operation: &'static str,
        required: InterfaceMode,
    },
    #[error(transparent)]
    Robot(#[from] RobotError),
    #[error("interrupted by simulator shutdown")]
    Interrupted,
}

impl InterfaceError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, InterfaceError::Interrupted)
    }
}
