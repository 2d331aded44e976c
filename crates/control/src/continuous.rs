//! Continuous driver
//!
//! Wheel speeds go straight to the robot and the physics engine integrates
//! them. Sensor reads cost real time: each read is paced to one physics
//! frame, and a read whose computation outlasts the sensor's declared
//! latency is reported.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use mechanics::{SharedRobot, lock_read, lock_write};
use simcore::Shutdown;

use crate::error::InterfaceError;

/// Outcome of one paced sensor read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedRead {
    pub value: f64,
    /// Time spent computing the measurement
    pub duration: Duration,
    /// How far the computation ran past the declared latency, if it did
    pub overrun: Option<Duration>,
    /// Whether the overrun was logged as a late-read warning
    pub reported: bool,
}

pub struct ContinuousDriver {
    robot: SharedRobot,
    shutdown: Shutdown,
    frame: Duration,
    report_late_reads: bool,
    late_reads: AtomicU64,
}

impl ContinuousDriver {
    pub fn new(robot: SharedRobot, shutdown: Shutdown, frame: Duration, report_late_reads: bool) -> Self {
        ContinuousDriver {
            robot,
            shutdown,
            frame,
            report_late_reads,
            late_reads: AtomicU64::new(0),
        }
    }

    pub fn set_wheel_speeds(&self, left: f64, right: f64) {
        lock_write(&self.robot).set_wheel_speeds(left, right);
        log::trace!("wheel speeds set to ({:.3}, {:.3}) rad/s", left, right);
    }

    /// Measure, report lateness, then wait out the rest of the frame.
    ///
    /// The robot lock is held only to capture the pending reading; the
    /// measurement itself runs unlocked so the physics thread keeps ticking.
    pub fn read(&self, name: &str) -> Result<TimedRead, InterfaceError> {
        let pending = lock_read(&self.robot).pending_reading(name)?;
        let start = Instant::now();
        let reading = pending.measure();
        let duration = start.elapsed();

        let overrun = duration.checked_sub(reading.read_latency).filter(|d| !d.is_zero());
        let reported = overrun.is_some() && self.report_late_reads;
        if let Some(late) = overrun {
            self.late_reads.fetch_add(1, Ordering::Relaxed);
            if reported {
                let latency = reading.read_latency.as_secs_f64();
                let percent = if latency > 0.0 {
                    late.as_secs_f64() / latency * 100.0
                } else {
                    f64::INFINITY
                };
                log::warn!(
                    "sensor read `{}` was late by {:.6} seconds, which is {:.1} percent late",
                    name,
                    late.as_secs_f64(),
                    percent
                );
            }
        }

        if !self.shutdown.sleep(self.frame.saturating_sub(duration)) {
            return Err(InterfaceError::Interrupted);
        }

        Ok(TimedRead {
            value: reading.value,
            duration,
            overrun,
            reported,
        })
    }

    /// Reads that ran past their declared latency so far.
    pub fn late_reads(&self) -> u64 {
        self.late_reads.load(Ordering::Relaxed)
    }
}
