use control::{ControlInterface, InterfaceError, MouseAlgorithm};
use simcore::InterfaceMode;

/// Left-hand rule in the discrete interface.
///
/// Undo steps back to the previous cell; reset returns to the start and
/// forgets the path.
pub struct WallFollower {
    max_moves: usize,
    goal: Option<(i32, i32)>,
    /// Cells left behind by each completed move
    trail: Vec<(i32, i32)>,
}

impl WallFollower {
    pub fn new(max_moves: usize, goal: Option<(i32, i32)>) -> Self {
        WallFollower {
            max_moves,
            goal,
            trail: Vec::new(),
        }
    }

    pub fn moves(&self) -> usize {
        self.trail.len()
    }

    fn step(&mut self, mouse: &ControlInterface) -> Result<(), InterfaceError> {
        if !mouse.wall_left()? {
            mouse.turn_left()?;
        } else if mouse.wall_front()? {
            if mouse.wall_right()? {
                return mouse.turn_around();
            }
            mouse.turn_right()?;
        }

        let from = mouse.cell();
        mouse.move_forward()?;
        if mouse.cell() != from {
            self.trail.push(from);
        }
        Ok(())
    }

    fn undo(&mut self, mouse: &ControlInterface) -> Result<(), InterfaceError> {
        if let Some(previous) = self.trail.pop() {
            log::info!("undo: returning to ({}, {})", previous.0, previous.1);
            mouse.turn_around()?;
            mouse.move_forward()?;
            mouse.turn_around()?;
        }
        mouse.undo_honored();
        Ok(())
    }
}

impl MouseAlgorithm for WallFollower {
    fn name(&self) -> &str {
        "wall_follower"
    }

    fn interface_mode(&self) -> InterfaceMode {
        InterfaceMode::Discrete
    }

    fn solve(&mut self, mouse: &ControlInterface) -> Result<(), InterfaceError> {
        while self.moves() < self.max_moves {
            if mouse.reset_requested() {
                log::info!("reset: back to the start after {} moves", self.moves());
                mouse.reset_position();
                self.trail.clear();
                mouse.reset_honored();
                continue;
            }
            if mouse.undo_requested() {
                self.undo(mouse)?;
                continue;
            }
            if self.goal == Some(mouse.cell()) {
                log::info!("goal {:?} reached in {} moves", self.goal, self.moves());
                return Ok(());
            }
            self.step(mouse)?;
        }
        log::warn!("stopped after {} moves without reaching the goal", self.moves());
        Ok(())
    }
}
