//! Monotonic time source and cancellable waits.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Process time base. The start timestamp is fixed at construction and
/// never reset during a run.
#[derive(Debug, Clone)]
pub struct Clock {
    start: Instant,
    start_unix: Duration,
}

impl Clock {
    pub fn new() -> Self {
        Clock {
            start: Instant::now(),
            start_unix: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default(),
        }
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn now(&self) -> Instant {
        Instant::now()
    }

    /// Time since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_since(&self, timestamp: Instant) -> Duration {
        Instant::now().saturating_duration_since(timestamp)
    }

    /// Identifier for this run, derived from the start timestamp.
    pub fn run_id(&self) -> String {
        format!(
            "run-{}-{:03}",
            self.start_unix.as_secs(),
            self.start_unix.subsec_millis()
        )
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable shutdown token.
///
/// Every pacing wait in the simulator goes through [`Shutdown::sleep`], so a
/// single `trigger` wakes all sleepers instead of leaving threads parked in
/// `thread::sleep`.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        let (flag, _) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for `duration` unless shutdown fires first.
    ///
    /// Returns `true` when the full duration elapsed and `false` when the
    /// wait was cut short (or shutdown had already fired).
    pub fn sleep(&self, duration: Duration) -> bool {
        self.sleep_until(Instant::now() + duration)
    }

    /// Wait until `deadline` unless shutdown fires first.
    pub fn sleep_until(&self, deadline: Instant) -> bool {
        let (flag, cvar) = &*self.inner;
        let mut triggered = flag.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            if *triggered {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            // Spurious wakeups fall through to the deadline check
            triggered = cvar
                .wait_timeout(triggered, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}
