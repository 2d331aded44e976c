use simcore::InterfaceMode;

use crate::error::InterfaceError;
use crate::interface::ControlInterface;

/// A navigation algorithm driving the mouse through the control interface.
pub trait MouseAlgorithm: Send {
    fn name(&self) -> &str;

    /// Interface the algorithm is written against.
    fn interface_mode(&self) -> InterfaceMode;

    /// Run until done. Errors end the run.
    fn solve(&mut self, mouse: &ControlInterface) -> Result<(), InterfaceError>;
}

/// Declare the algorithm's mode, then hand it the interface.
pub fn run_algorithm(
    algorithm: &mut dyn MouseAlgorithm,
    mouse: &ControlInterface,
) -> Result<(), InterfaceError> {
    log::info!(
        "starting algorithm `{}` ({} interface)",
        algorithm.name(),
        algorithm.interface_mode()
    );
    mouse.declare_mode(algorithm.interface_mode())?;
    algorithm.solve(mouse)?;
    log::info!(
        "algorithm `{}` finished after {:.2}s",
        algorithm.name(),
        mouse.elapsed().as_secs_f64()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechanics::{GridMaze, Maze, Robot};
    use simcore::{Clock, SharedControlState, Shutdown, SimConfig};
    use std::sync::Arc;

    struct ForwardTwice;

    impl MouseAlgorithm for ForwardTwice {
        fn name(&self) -> &str {
            "forward twice"
        }

        fn interface_mode(&self) -> InterfaceMode {
            InterfaceMode::Discrete
        }

        fn solve(&mut self, mouse: &ControlInterface) -> Result<(), InterfaceError> {
            mouse.move_forward()?;
            mouse.move_forward()
        }
    }

    struct WheelsInDiscrete;

    impl MouseAlgorithm for WheelsInDiscrete {
        fn name(&self) -> &str {
            "misbehaving"
        }

        fn interface_mode(&self) -> InterfaceMode {
            InterfaceMode::Discrete
        }

        fn solve(&mut self, mouse: &ControlInterface) -> Result<(), InterfaceError> {
            mouse.set_wheel_speeds(1.0, 1.0)
        }
    }

    fn interface() -> ControlInterface {
        let config = SimConfig::default().with_stabilization_delay_ms(0);
        let maze: Arc<dyn Maze> = Arc::new(GridMaze::bordered(1, 4));
        let robot = Robot::from_config(&config, maze).into_shared();
        ControlInterface::new(
            &config,
            robot,
            Arc::new(SharedControlState::default()),
            Arc::new(Clock::new()),
            Shutdown::new(),
        )
    }

    #[test]
    fn test_run_algorithm_declares_mode() {
        let mouse = interface();
        run_algorithm(&mut ForwardTwice, &mouse).unwrap();

        assert_eq!(mouse.mode(), InterfaceMode::Discrete);
        assert_eq!(mouse.cell(), (0, 2));
    }

    #[test]
    fn test_misuse_surfaces_as_error() {
        let mouse = interface();
        let result = run_algorithm(&mut WheelsInDiscrete, &mouse);

        assert_eq!(
            result,
            Err(InterfaceError::WrongMode {
                operation: "set_wheel_speeds",
                required: InterfaceMode::Continuous,
            })
        );
    }
}
