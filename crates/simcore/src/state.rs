//! Shared control state
//!
//! Flags exchanged between the rendering/input context and the control
//! interface:
//! - the interface mode, declared at most once per run
//! - undo and reset requests, each a single-flag handshake (set by the
//!   input side, cleared by the control side)
//! - a pause flag read by the physics engine
//!
//! One instance is created at startup and handed to every component as an
//! `Arc<SharedControlState>`.

use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Shutdown;
use crate::error::ModeError;

/// Control abstraction an algorithm drives the robot with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceMode {
    #[default]
    Undeclared,
    /// Cell-granular commands: move one cell, turn 90 degrees
    Discrete,
    /// Raw wheel speeds and latency-costed sensor reads
    Continuous,
}

impl fmt::Display for InterfaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterfaceMode::Undeclared => "undeclared",
            InterfaceMode::Discrete => "discrete",
            InterfaceMode::Continuous => "continuous",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct SharedControlState {
    mode: OnceLock<InterfaceMode>,
    undo_requested: AtomicBool,
    reset_requested: AtomicBool,
    paused: AtomicBool,
    run_id: String,
}

impl SharedControlState {
    pub fn new(run_id: impl Into<String>) -> Self {
        SharedControlState {
            mode: OnceLock::new(),
            undo_requested: AtomicBool::new(false),
            reset_requested: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            run_id: run_id.into(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The declared mode, or `Undeclared` before any declaration.
    pub fn mode(&self) -> InterfaceMode {
        self.mode.get().copied().unwrap_or_default()
    }

    /// Declare the interface mode for the rest of the run.
    ///
    /// Fails for `Undeclared` and for any second call, even with the same
    /// mode. On success the caller is held for `stabilization` so in-flight
    /// physics and rendering settle before algorithm control begins; the wait
    /// ends early if `shutdown` fires.
    pub fn declare_mode(
        &self,
        mode: InterfaceMode,
        stabilization: Duration,
        shutdown: &Shutdown,
    ) -> Result<(), ModeError> {
        if mode == InterfaceMode::Undeclared {
            return Err(ModeError::Undeclared);
        }

        self.mode
            .set(mode)
            .map_err(|_| ModeError::AlreadyDeclared { current: self.mode() })?;

        log::info!("interface mode declared as {}", mode);
        shutdown.sleep(stabilization);
        Ok(())
    }

    pub fn request_undo(&self) {
        self.undo_requested.store(true, Ordering::Release);
    }

    pub fn request_reset(&self) {
        self.reset_requested.store(true, Ordering::Release);
    }

    pub fn undo_requested(&self) -> bool {
        self.undo_requested.load(Ordering::Acquire)
    }

    pub fn reset_requested(&self) -> bool {
        self.reset_requested.load(Ordering::Acquire)
    }

    pub fn acknowledge_undo(&self) {
        if self.undo_requested.swap(false, Ordering::AcqRel) {
            log::debug!("undo request acknowledged");
        }
    }

    pub fn acknowledge_reset(&self) {
        if self.reset_requested.swap(false, Ordering::AcqRel) {
            log::debug!("reset request acknowledged");
        }
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

impl Default for SharedControlState {
    fn default() -> Self {
        Self::new("default")
    }
}
