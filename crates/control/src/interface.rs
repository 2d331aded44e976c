//! Control interface
//!
//! The only object algorithm code touches. It owns the mode declaration,
//! dispatches every mode-specific call to the driver selected at declaration
//! and exposes the undo/reset handshake with the renderer.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use mechanics::{SharedRobot, lock_read, lock_write};
use simcore::{Clock, Direction, InterfaceMode, SharedControlState, Shutdown, SimConfig};

use crate::continuous::{ContinuousDriver, TimedRead};
use crate::discrete::DiscreteDriver;
use crate::error::InterfaceError;

/// Driver selected once the interface mode is known.
enum Driver {
    Discrete(DiscreteDriver),
    Continuous(ContinuousDriver),
}

/// Timing parameters taken from the simulation config.
#[derive(Debug, Clone, Copy)]
struct Pacing {
    frame: Duration,
    stabilization: Duration,
    report_late_reads: bool,
}

pub struct ControlInterface {
    robot: SharedRobot,
    control: Arc<SharedControlState>,
    clock: Arc<Clock>,
    shutdown: Shutdown,
    pacing: Pacing,
    driver: OnceLock<Driver>,
}

impl ControlInterface {
    pub fn new(
        config: &SimConfig,
        robot: SharedRobot,
        control: Arc<SharedControlState>,
        clock: Arc<Clock>,
        shutdown: Shutdown,
    ) -> Self {
        ControlInterface {
            robot,
            control,
            clock,
            shutdown,
            pacing: Pacing {
                frame: config.tick_duration(),
                stabilization: config.stabilization_delay(),
                report_late_reads: config.print_late_sensor_reads,
            },
            driver: OnceLock::new(),
        }
    }

    pub fn mode(&self) -> InterfaceMode {
        self.control.mode()
    }

    /// Declare the interface mode for the run. Blocks for the stabilization
    /// delay on success.
    pub fn declare_mode(&self, mode: InterfaceMode) -> Result<(), InterfaceError> {
        self.control
            .declare_mode(mode, self.pacing.stabilization, &self.shutdown)?;
        // Select the driver now rather than on the first command
        let driver = self.driver();
        debug_assert!(driver.is_some(), "no driver after declaring {}", mode);
        Ok(())
    }

    /// The driver for the declared mode, selected on first use.
    fn driver(&self) -> Option<&Driver> {
        let mode = self.control.mode();
        if mode == InterfaceMode::Undeclared {
            return None;
        }
        Some(self.driver.get_or_init(|| {
            log::debug!("selected {} driver", mode);
            match mode {
                InterfaceMode::Continuous => Driver::Continuous(ContinuousDriver::new(
                    Arc::clone(&self.robot),
                    self.shutdown.clone(),
                    self.pacing.frame,
                    self.pacing.report_late_reads,
                )),
                _ => Driver::Discrete(DiscreteDriver::new(
                    Arc::clone(&self.robot),
                    self.shutdown.clone(),
                )),
            }
        }))
    }

    fn ensure_discrete(&self, operation: &'static str) -> Result<&DiscreteDriver, InterfaceError> {
        match self.driver() {
            Some(Driver::Discrete(driver)) => Ok(driver),
            _ => Err(InterfaceError::WrongMode {
                operation,
                required: InterfaceMode::Discrete,
            }),
        }
    }

    fn ensure_continuous(
        &self,
        operation: &'static str,
    ) -> Result<&ContinuousDriver, InterfaceError> {
        match self.driver() {
            Some(Driver::Continuous(driver)) => Ok(driver),
            _ => Err(InterfaceError::WrongMode {
                operation,
                required: InterfaceMode::Continuous,
            }),
        }
    }

    // ========================================================================
    // Continuous
    // ========================================================================

    pub fn set_wheel_speeds(&self, left: f64, right: f64) -> Result<(), InterfaceError> {
        self.ensure_continuous("set_wheel_speeds")?
            .set_wheel_speeds(left, right);
        Ok(())
    }

    /// Read a named sensor. Each read takes at least one physics frame.
    pub fn read(&self, name: &str) -> Result<f64, InterfaceError> {
        Ok(self.read_timed(name)?.value)
    }

    /// [`ControlInterface::read`] with the measured computation time and
    /// any overrun of the sensor's declared latency.
    pub fn read_timed(&self, name: &str) -> Result<TimedRead, InterfaceError> {
        self.ensure_continuous("read")?.read(name)
    }

    /// Reads that ran past their declared latency. Zero outside continuous
    /// mode.
    pub fn late_reads(&self) -> u64 {
        match self.driver() {
            Some(Driver::Continuous(driver)) => driver.late_reads(),
            _ => 0,
        }
    }

    // ========================================================================
    // Discrete
    // ========================================================================

    pub fn wall_front(&self) -> Result<bool, InterfaceError> {
        Ok(self.ensure_discrete("wall_front")?.wall_front())
    }

    pub fn wall_right(&self) -> Result<bool, InterfaceError> {
        Ok(self.ensure_discrete("wall_right")?.wall_right())
    }

    pub fn wall_left(&self) -> Result<bool, InterfaceError> {
        Ok(self.ensure_discrete("wall_left")?.wall_left())
    }

    pub fn move_forward(&self) -> Result<(), InterfaceError> {
        self.ensure_discrete("move_forward")?.move_forward()
    }

    pub fn turn_right(&self) -> Result<(), InterfaceError> {
        self.ensure_discrete("turn_right")?.turn_right()
    }

    pub fn turn_left(&self) -> Result<(), InterfaceError> {
        self.ensure_discrete("turn_left")?.turn_left()
    }

    pub fn turn_around(&self) -> Result<(), InterfaceError> {
        self.ensure_discrete("turn_around")?.turn_around()
    }

    /// Current cardinal heading, for algorithms that track their own map.
    pub fn heading(&self) -> Result<Direction, InterfaceError> {
        Ok(self.ensure_discrete("heading")?.heading())
    }

    // ========================================================================
    // Any mode
    // ========================================================================

    pub fn undo_requested(&self) -> bool {
        self.control.undo_requested()
    }

    pub fn reset_requested(&self) -> bool {
        self.control.reset_requested()
    }

    pub fn undo_honored(&self) {
        self.control.acknowledge_undo();
    }

    pub fn reset_honored(&self) {
        self.control.acknowledge_reset();
    }

    /// Wait `milliseconds`, cut short by shutdown.
    pub fn delay(&self, milliseconds: u64) -> Result<(), InterfaceError> {
        if self.shutdown.sleep(Duration::from_millis(milliseconds)) {
            Ok(())
        } else {
            Err(InterfaceError::Interrupted)
        }
    }

    /// Put the robot back on its starting pose with the wheels stopped.
    pub fn reset_position(&self) {
        lock_write(&self.robot).reset_position();
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Cell the robot is currently in, as (x, y).
    pub fn cell(&self) -> (i32, i32) {
        let cell = lock_read(&self.robot).discretized_cell();
        (cell.x, cell.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mechanics::{Cell, CellGeometry, GridMaze, Maze, PhysicsEngine, Robot, Sensor};
    use simcore::Pose;
    use std::thread;
    use std::time::Instant;

    fn config() -> SimConfig {
        SimConfig::default().with_stabilization_delay_ms(0)
    }

    fn interface_with(maze: GridMaze, robot: impl FnOnce(Robot) -> Robot) -> ControlInterface {
        configured_interface(config(), maze, robot)
    }

    fn configured_interface(
        config: SimConfig,
        maze: GridMaze,
        robot: impl FnOnce(Robot) -> Robot,
    ) -> ControlInterface {
        let maze: Arc<dyn Maze> = Arc::new(maze);
        let robot = robot(Robot::from_config(&config, maze)).into_shared();
        ControlInterface::new(
            &config,
            robot,
            Arc::new(SharedControlState::default()),
            Arc::new(Clock::new()),
            Shutdown::new(),
        )
    }

    fn interface(maze: GridMaze) -> ControlInterface {
        interface_with(maze, |robot| robot)
    }

    fn teleport(mouse: &ControlInterface, cell: Cell, direction: Direction) {
        let mut robot = lock_write(&mouse.robot);
        let center = robot.geometry().center_of(cell);
        robot.teleport(center, direction.heading());
    }

    fn slow_sensor(latency: Duration, work: Duration) -> Sensor {
        Sensor::new(latency, move |_: &Pose, _: &dyn Maze, _: &CellGeometry| {
            thread::sleep(work);
            0.125
        })
    }

    fn pose(mouse: &ControlInterface) -> Pose {
        lock_read(&mouse.robot).pose()
    }

    #[test]
    fn test_second_declaration_fails() {
        let mouse = interface(GridMaze::bordered(2, 2));
        mouse.declare_mode(InterfaceMode::Discrete).unwrap();

        for mode in [
            InterfaceMode::Undeclared,
            InterfaceMode::Discrete,
            InterfaceMode::Continuous,
        ] {
            assert!(matches!(
                mouse.declare_mode(mode),
                Err(InterfaceError::Mode(_))
            ));
        }
        assert_eq!(mouse.mode(), InterfaceMode::Discrete);
    }

    #[test]
    fn test_declaration_selects_driver() {
        let mouse = interface(GridMaze::bordered(2, 2));
        assert!(mouse.driver.get().is_none());

        mouse.declare_mode(InterfaceMode::Continuous).unwrap();
        assert!(matches!(mouse.driver.get(), Some(Driver::Continuous(_))));
    }

    #[test]
    fn test_operations_before_declaration_fail() {
        let mouse = interface(GridMaze::bordered(2, 2));

        assert_eq!(
            mouse.wall_front(),
            Err(InterfaceError::WrongMode {
                operation: "wall_front",
                required: InterfaceMode::Discrete
            })
        );
        assert_eq!(
            mouse.read("front"),
            Err(InterfaceError::WrongMode {
                operation: "read",
                required: InterfaceMode::Continuous
            })
        );
    }

    #[test]
    fn test_modes_do_not_mix() {
        let discrete = interface(GridMaze::bordered(2, 2));
        discrete.declare_mode(InterfaceMode::Discrete).unwrap();
        assert!(matches!(
            discrete.set_wheel_speeds(1.0, 1.0),
            Err(InterfaceError::WrongMode { operation: "set_wheel_speeds", .. })
        ));

        let continuous = interface(GridMaze::bordered(2, 2));
        continuous.declare_mode(InterfaceMode::Continuous).unwrap();
        assert!(matches!(
            continuous.move_forward(),
            Err(InterfaceError::WrongMode { operation: "move_forward", .. })
        ));
        assert!(matches!(
            continuous.turn_around(),
            Err(InterfaceError::WrongMode { operation: "turn_around", .. })
        ));
    }

    #[test]
    fn test_wall_right_rotates_clockwise() {
        // Single wall on the east side of (1, 1)
        let maze = GridMaze::bordered(3, 3).with_wall(Cell::new(1, 1), Direction::East);
        let mouse = interface(maze);
        mouse.declare_mode(InterfaceMode::Discrete).unwrap();
        let cell = Cell::new(1, 1);

        for heading in Direction::ALL {
            teleport(&mouse, cell, heading);
            let expected = lock_read(&mouse.robot).wall_present(heading.right());
            assert_eq!(mouse.wall_right().unwrap(), expected, "facing {}", heading);
        }

        teleport(&mouse, cell, Direction::North);
        assert!(mouse.wall_right().unwrap());
        assert!(!mouse.wall_left().unwrap());
        assert!(!mouse.wall_front().unwrap());

        teleport(&mouse, cell, Direction::South);
        assert!(mouse.wall_left().unwrap());
        assert!(!mouse.wall_right().unwrap());

        teleport(&mouse, cell, Direction::East);
        assert!(mouse.wall_front().unwrap());
    }

    #[test]
    fn test_move_forward_lands_on_next_cell_center() {
        let mouse = interface(GridMaze::bordered(3, 3));
        mouse.declare_mode(InterfaceMode::Discrete).unwrap();
        let p = config().cell_pitch();

        let start = Instant::now();
        mouse.move_forward().unwrap();
        let elapsed = start.elapsed();

        let pose = pose(&mouse);
        assert_abs_diff_eq!(pose.position.x, 0.5 * p, epsilon = 1e-12);
        assert_abs_diff_eq!(pose.position.y, 1.5 * p, epsilon = 1e-12);
        assert_abs_diff_eq!(pose.heading, 0.0, epsilon = 1e-12);
        assert!(elapsed >= Duration::from_millis(100));
        assert_eq!(mouse.cell(), (0, 1));
    }

    #[test]
    fn test_move_forward_into_wall_is_refused() {
        let mouse = interface(GridMaze::bordered(1, 1));
        mouse.declare_mode(InterfaceMode::Discrete).unwrap();
        let before = pose(&mouse);

        mouse.move_forward().unwrap();

        assert_eq!(pose(&mouse), before);
        assert_eq!(mouse.cell(), (0, 0));
    }

    #[test]
    fn test_turns_update_heading() {
        let mouse = interface(GridMaze::bordered(2, 2));
        mouse.declare_mode(InterfaceMode::Discrete).unwrap();

        mouse.turn_right().unwrap();
        assert_eq!(mouse.heading().unwrap(), Direction::East);
        mouse.turn_left().unwrap();
        mouse.turn_left().unwrap();
        assert_eq!(mouse.heading().unwrap(), Direction::West);
        assert_abs_diff_eq!(pose(&mouse).heading, Direction::West.heading(), epsilon = 1e-12);
    }

    #[test]
    fn test_turn_around_passes_through_right_turn() {
        let mouse = Arc::new(interface(GridMaze::bordered(2, 2)));
        mouse.declare_mode(InterfaceMode::Discrete).unwrap();

        let watcher = {
            let mouse = Arc::clone(&mouse);
            thread::spawn(move || {
                let mut seen = Vec::new();
                let deadline = Instant::now() + Duration::from_millis(400);
                while Instant::now() < deadline {
                    let heading = lock_read(&mouse.robot).discretized_heading();
                    if seen.last() != Some(&heading) {
                        seen.push(heading);
                    }
                    thread::sleep(Duration::from_micros(200));
                }
                seen
            })
        };

        mouse.turn_around().unwrap();
        let seen = watcher.join().unwrap();

        assert_eq!(mouse.heading().unwrap(), Direction::South);
        assert!(seen.contains(&Direction::East));
        assert!(!seen.contains(&Direction::West));
    }

    #[test]
    fn test_slow_read_is_reported_and_returned_unchanged() {
        let mouse = interface_with(GridMaze::bordered(2, 2), |robot| {
            robot.with_sensor(
                "slow",
                slow_sensor(Duration::from_millis(1), Duration::from_millis(5)),
            )
        });
        mouse.declare_mode(InterfaceMode::Continuous).unwrap();

        let read = mouse.read_timed("slow").unwrap();
        assert_eq!(read.value, 0.125);
        assert!(read.overrun.is_some_and(|late| late >= Duration::from_millis(4)));
        assert!(read.reported);
        assert_eq!(mouse.late_reads(), 1);
    }

    #[test]
    fn test_late_read_warning_can_be_silenced() {
        let config = SimConfig {
            print_late_sensor_reads: false,
            ..config()
        };
        let mouse = configured_interface(config, GridMaze::bordered(2, 2), |robot| {
            robot.with_sensor(
                "slow",
                slow_sensor(Duration::from_millis(1), Duration::from_millis(5)),
            )
        });
        mouse.declare_mode(InterfaceMode::Continuous).unwrap();

        let read = mouse.read_timed("slow").unwrap();
        assert!(read.overrun.is_some());
        assert!(!read.reported);
        // Still counted
        assert_eq!(mouse.late_reads(), 1);

        let on_time = mouse.read_timed("front").unwrap();
        assert!(on_time.overrun.is_none());
        assert!(!on_time.reported);
        assert_eq!(mouse.late_reads(), 1);
    }

    #[test]
    fn test_slow_read_does_not_stall_physics() {
        let config = config().with_frame_rate(200.0);
        let maze: Arc<dyn Maze> = Arc::new(GridMaze::bordered(2, 2));
        let robot = Robot::from_config(&config, maze).with_sensor(
            "slow",
            slow_sensor(Duration::from_millis(1), Duration::from_millis(300)),
        );
        let control = Arc::new(SharedControlState::default());
        let clock = Arc::new(Clock::new());
        let shutdown = Shutdown::new();
        let mut engine = PhysicsEngine::new(
            config.clone(),
            robot,
            Arc::clone(&control),
            Arc::clone(&clock),
            shutdown.clone(),
        );
        engine.start().unwrap();
        let mouse = ControlInterface::new(&config, engine.robot(), control, clock, shutdown);
        mouse.declare_mode(InterfaceMode::Continuous).unwrap();

        let before = engine.ticks();
        let read = mouse.read_timed("slow").unwrap();
        let during = engine.ticks() - before;
        engine.stop();

        // 300 ms at 200 Hz is 60 ticks; a blocked loop catches up at most 5
        assert!(during >= 30, "only {} ticks during a 300 ms read", during);
        assert!(read.duration >= Duration::from_millis(300));
        assert!(read.duration < Duration::from_millis(400));
    }

    #[test]
    fn test_read_is_paced_to_one_frame() {
        let mouse = interface(GridMaze::bordered(1, 1));
        mouse.declare_mode(InterfaceMode::Continuous).unwrap();

        let start = Instant::now();
        let value = mouse.read("front").unwrap();

        assert!(start.elapsed() >= config().tick_duration());
        // Front border at 0.18 - 0.006, seen from y = 0.09
        assert_abs_diff_eq!(value, 0.084, epsilon = 1e-9);
        assert_eq!(mouse.late_reads(), 0);
    }

    #[test]
    fn test_unknown_sensor_is_an_error() {
        let mouse = interface(GridMaze::bordered(2, 2));
        mouse.declare_mode(InterfaceMode::Continuous).unwrap();

        assert!(matches!(mouse.read("lidar"), Err(InterfaceError::Robot(_))));
    }

    #[test]
    fn test_set_wheel_speeds_reaches_robot() {
        let mouse = interface(GridMaze::bordered(2, 2));
        mouse.declare_mode(InterfaceMode::Continuous).unwrap();

        mouse.set_wheel_speeds(4.0, -2.0).unwrap();

        let wheels = lock_read(&mouse.robot).wheel_speeds();
        assert_eq!((wheels.left, wheels.right), (4.0, -2.0));
    }

    #[test]
    fn test_undo_and_reset_handshake() {
        let mouse = interface(GridMaze::bordered(2, 2));
        mouse.control.request_undo();
        mouse.control.request_reset();

        assert!(mouse.undo_requested());
        assert!(mouse.reset_requested());
        mouse.undo_honored();
        assert!(!mouse.undo_requested());
        assert!(mouse.reset_requested());
        mouse.reset_honored();
        assert!(!mouse.reset_requested());
    }

    #[test]
    fn test_shutdown_interrupts_motion_and_finishes_pose() {
        let mouse = interface(GridMaze::bordered(3, 3));
        mouse.declare_mode(InterfaceMode::Discrete).unwrap();
        mouse.shutdown.trigger();

        assert_eq!(mouse.move_forward(), Err(InterfaceError::Interrupted));
        assert_eq!(mouse.cell(), (0, 1));
        assert_eq!(mouse.delay(50), Err(InterfaceError::Interrupted));
    }

    #[test]
    fn test_reset_position_returns_to_start() {
        let mouse = interface(GridMaze::bordered(3, 3));
        mouse.declare_mode(InterfaceMode::Discrete).unwrap();
        let start = pose(&mouse);

        mouse.move_forward().unwrap();
        mouse.turn_right().unwrap();
        mouse.reset_position();

        assert_eq!(pose(&mouse), start);
    }
}
