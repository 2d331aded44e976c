use crate::{Pose, SimContext, Twist};

/// A pose integration strategy.
pub trait Integrator {
    /// Advances the pose by one timestep under a constant body twist.
    fn step(&self, ctx: &SimContext, pose: &mut Pose, twist: Twist);
}

/// Explicit (forward) Euler integrator.
/// Translation uses the heading at the start of the step, then the heading
/// is advanced. First-order accurate, exact for straight-line motion and for
/// pure rotation in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step(&self, ctx: &SimContext, pose: &mut Pose, twist: Twist) {
        let dt = ctx.dt;
        let forward = pose.forward();

        pose.position += forward * (twist.linear * dt);
        pose.heading += twist.angular * dt;
    }
}

/// Fixed-timestep accumulator that converts elapsed wall-clock time into a
/// whole number of fixed ticks.
///
/// Leftover time carries over to the next call. When the caller falls far
/// behind, at most `max_steps` ticks are owed per call and the excess is
/// dropped, so a stalled thread does not trigger a burst of catch-up work.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    pub fixed_dt: f64,
    pub accumulator: f64,
    pub max_steps: u32,
}

impl FixedTimestep {
    pub fn new(fixed_dt: f64, max_steps: u32) -> Self {
        FixedTimestep {
            fixed_dt,
            accumulator: 0.0,
            max_steps: max_steps.max(1),
        }
    }

    /// Adds `dt` seconds and returns how many fixed ticks are now due.
    pub fn advance(&mut self, dt: f64) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut steps = 0;

        while self.accumulator >= self.fixed_dt && steps < self.max_steps {
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }

        if steps == self.max_steps && self.accumulator >= self.fixed_dt {
            let carried = self.accumulator % self.fixed_dt;
            log::debug!(
                "dropping {:.4}s of owed simulation time",
                self.accumulator - carried
            );
            self.accumulator = carried;
        }

        steps
    }
}
