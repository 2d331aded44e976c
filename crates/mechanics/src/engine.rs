//! Physics engine
//!
//! Runs the fixed-rate tick loop on a dedicated `physics` thread:
//! - resolves the motion strategy once an interface mode is declared
//! - advances the robot by one fixed tick per period (skipped while paused)
//! - records the pose history
//!
//! Wakeups that arrive late run the owed ticks back to back, up to the
//! configured catch-up limit.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use simcore::{
    Clock, ConfigError, FixedTimestep, InterfaceMode, SharedControlState, Shutdown, SimConfig,
    SimContext,
};
use thiserror::Error;

use crate::drive::DifferentialDriveConfig;
use crate::motion::{MotionStrategy, strategy_for};
use crate::robot::{Robot, SharedRobot, lock_write};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid simulation config: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to spawn physics thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
}

/// Per-tick work shared by the physics thread and [`PhysicsEngine::step`].
struct Ticker {
    drive: DifferentialDriveConfig,
    strategy: Option<Box<dyn MotionStrategy>>,
    dt: f64,
    ticks: u64,
}

impl Ticker {
    fn new(config: &SimConfig) -> Self {
        Ticker {
            drive: DifferentialDriveConfig::from_config(config),
            strategy: None,
            dt: config.tick_seconds(),
            ticks: 0,
        }
    }

    fn tick(&mut self, robot: &SharedRobot, control: &SharedControlState, t: f64) {
        if self.strategy.is_none() {
            let mode = control.mode();
            if mode != InterfaceMode::Undeclared {
                let strategy = strategy_for(mode, self.drive);
                log::info!("physics motion strategy: {}", strategy.name());
                self.strategy = Some(strategy);
            }
        }

        if control.paused() {
            return;
        }

        let ctx = SimContext { dt: self.dt, t };
        let mut robot = lock_write(robot);
        if let Some(strategy) = self.strategy.as_mut() {
            strategy.advance(ctx, &mut robot);
        }
        robot.record(t);
        self.ticks += 1;

        log::trace!(
            "tick {} at {:.3}s: cell ({}, {}) facing {}",
            self.ticks,
            t,
            robot.discretized_cell().x,
            robot.discretized_cell().y,
            robot.discretized_heading()
        );
    }
}

pub struct PhysicsEngine {
    config: SimConfig,
    robot: SharedRobot,
    control: Arc<SharedControlState>,
    clock: Arc<Clock>,
    shutdown: Shutdown,
    ticker: Arc<Mutex<Ticker>>,
    started: bool,
    handle: Option<JoinHandle<()>>,
}

impl PhysicsEngine {
    pub fn new(
        config: SimConfig,
        robot: Robot,
        control: Arc<SharedControlState>,
        clock: Arc<Clock>,
        shutdown: Shutdown,
    ) -> Self {
        let ticker = Ticker::new(&config);
        PhysicsEngine {
            config,
            robot: robot.into_shared(),
            control,
            clock,
            shutdown,
            ticker: Arc::new(Mutex::new(ticker)),
            started: false,
            handle: None,
        }
    }

    /// Shared handle to the robot for the control interface and renderer.
    pub fn robot(&self) -> SharedRobot {
        Arc::clone(&self.robot)
    }

    pub fn state(&self) -> EngineState {
        match &self.handle {
            Some(handle) if !handle.is_finished() => EngineState::Running,
            _ => EngineState::Stopped,
        }
    }

    /// Number of ticks that advanced the robot so far.
    pub fn ticks(&self) -> u64 {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner).ticks
    }

    /// Validate the configuration and start the tick loop.
    ///
    /// An engine runs at most once: later calls log a warning and return.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.started {
            log::warn!("physics engine already started, ignoring start()");
            return Ok(());
        }
        self.config.validate()?;

        let ticker = Arc::clone(&self.ticker);
        let robot = Arc::clone(&self.robot);
        let control = Arc::clone(&self.control);
        let clock = Arc::clone(&self.clock);
        let shutdown = self.shutdown.clone();
        let tick = self.config.tick_duration();
        let max_catch_up = self.config.max_catch_up_ticks;

        let handle = thread::Builder::new()
            .name("physics".into())
            .spawn(move || {
                run_physics_loop(ticker, robot, control, clock, shutdown, tick, max_catch_up);
            })?;

        self.started = true;
        self.handle = Some(handle);
        log::info!(
            "physics engine started at {:.1} Hz (run {})",
            self.config.frame_rate,
            self.control.run_id()
        );
        Ok(())
    }

    /// Signal shutdown and wait for the physics thread to exit.
    pub fn stop(&mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("physics thread panicked");
            } else {
                log::info!("physics engine stopped after {} ticks", self.ticks());
            }
        }
    }

    /// Run exactly one tick on the calling thread.
    pub fn step(&self) {
        let t = self.clock.elapsed().as_secs_f64();
        self.ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tick(&self.robot, &self.control, t);
    }
}

impl Drop for PhysicsEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_physics_loop(
    ticker: Arc<Mutex<Ticker>>,
    robot: SharedRobot,
    control: Arc<SharedControlState>,
    clock: Arc<Clock>,
    shutdown: Shutdown,
    tick: Duration,
    max_catch_up: u32,
) {
    let mut stepper = FixedTimestep::new(tick.as_secs_f64(), max_catch_up);
    let mut last = Instant::now();
    let mut next = last + tick;

    while shutdown.sleep_until(next) {
        let now = Instant::now();
        let due = stepper.advance(now.duration_since(last).as_secs_f64());
        last = now;

        if due > 1 {
            log::debug!("physics thread behind, running {} ticks", due);
        }
        for _ in 0..due {
            let t = clock.elapsed().as_secs_f64();
            ticker
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .tick(&robot, &control, t);
        }

        let remaining = (stepper.fixed_dt - stepper.accumulator).max(0.0);
        next = now + Duration::from_secs_f64(remaining);
    }
    log::debug!("physics loop exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{GridMaze, Maze};
    use crate::robot::lock_read;
    use approx::assert_abs_diff_eq;

    struct Fixture {
        engine: PhysicsEngine,
        control: Arc<SharedControlState>,
        shutdown: Shutdown,
    }

    fn fixture(config: SimConfig) -> Fixture {
        let maze: Arc<dyn Maze> = Arc::new(GridMaze::bordered(4, 8));
        let robot = Robot::from_config(&config, maze);
        let control = Arc::new(SharedControlState::default());
        let shutdown = Shutdown::new();
        let engine = PhysicsEngine::new(
            config,
            robot,
            Arc::clone(&control),
            Arc::new(Clock::new()),
            shutdown.clone(),
        );
        Fixture { engine, control, shutdown }
    }

    fn declare(control: &SharedControlState, mode: InterfaceMode) {
        control.declare_mode(mode, Duration::ZERO, &Shutdown::new()).unwrap();
    }

    #[test]
    fn test_no_integration_before_declaration() {
        let f = fixture(SimConfig::default());
        let robot = f.engine.robot();
        lock_write(&robot).set_wheel_speeds(50.0, 50.0);
        let before = lock_read(&robot).pose();

        for _ in 0..10 {
            f.engine.step();
        }

        assert_eq!(lock_read(&robot).pose(), before);
    }

    #[test]
    fn test_continuous_step_integrates_wheels() {
        let f = fixture(SimConfig::default());
        declare(&f.control, InterfaceMode::Continuous);
        let robot = f.engine.robot();
        lock_write(&robot).set_wheel_speeds(30.0, 30.0);

        f.engine.step();

        let pose = lock_read(&robot).pose();
        assert_abs_diff_eq!(pose.position.y, 0.09 + 30.0 * 0.02 / 60.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pose.heading, 0.0, epsilon = 1e-12);
        assert_eq!(f.engine.ticks(), 1);
    }

    #[test]
    fn test_discrete_mode_ignores_wheels() {
        let f = fixture(SimConfig::default());
        declare(&f.control, InterfaceMode::Discrete);
        let robot = f.engine.robot();
        lock_write(&robot).set_wheel_speeds(30.0, 30.0);
        let before = lock_read(&robot).pose();

        f.engine.step();

        assert_eq!(lock_read(&robot).pose(), before);
    }

    #[test]
    fn test_pause_skips_integration() {
        let f = fixture(SimConfig::default());
        declare(&f.control, InterfaceMode::Continuous);
        let robot = f.engine.robot();
        lock_write(&robot).set_wheel_speeds(30.0, -30.0);
        let before = lock_read(&robot).pose();

        f.control.set_paused(true);
        f.engine.step();
        assert_eq!(lock_read(&robot).pose(), before);
        assert_eq!(f.engine.ticks(), 0);

        f.control.set_paused(false);
        f.engine.step();
        assert!(lock_read(&robot).pose().heading < before.heading);
    }

    #[test]
    fn test_invalid_config_fails_start() {
        let mut f = fixture(SimConfig::default().with_frame_rate(0.0));
        assert!(matches!(
            f.engine.start(),
            Err(EngineError::Config(ConfigError::FrameRate(_)))
        ));
        assert_eq!(f.engine.state(), EngineState::Stopped);
    }

    #[test]
    fn test_tiny_frame_rate_fails_start() {
        let mut f = fixture(SimConfig::default().with_frame_rate(1e-300));
        assert!(matches!(
            f.engine.start(),
            Err(EngineError::Config(ConfigError::FrameRate(_)))
        ));
        assert_eq!(f.engine.ticks(), 0);
    }

    #[test]
    fn test_thread_runs_and_stops() {
        let mut f = fixture(SimConfig::default().with_frame_rate(200.0));
        declare(&f.control, InterfaceMode::Continuous);
        let robot = f.engine.robot();
        lock_write(&robot).set_wheel_speeds(5.0, 5.0);

        f.engine.start().unwrap();
        assert_eq!(f.engine.state(), EngineState::Running);
        // Second start is ignored
        f.engine.start().unwrap();

        std::thread::sleep(Duration::from_millis(100));
        f.engine.stop();

        assert!(f.shutdown.is_triggered());
        assert_eq!(f.engine.state(), EngineState::Stopped);
        assert!(f.engine.ticks() > 0);
        assert!(lock_read(&robot).pose().position.y > 0.09);
        assert!(!lock_read(&robot).history().is_empty());
    }
}
