use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use simcore::Pose;

/// One recorded pose, timestamped in seconds since the clock started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub t: f64,
}

impl PoseSample {
    pub fn new(pose: &Pose, t: f64) -> Self {
        PoseSample {
            x: pose.position.x,
            y: pose.position.y,
            heading: pose.heading,
            t,
        }
    }

    fn same_pose(&self, other: &PoseSample) -> bool {
        self.x == other.x && self.y == other.y && self.heading == other.heading
    }
}

/// Bounded trail of robot poses for the renderer. Oldest samples drop first.
#[derive(Debug, Clone)]
pub struct PoseHistory {
    samples: VecDeque<PoseSample>,
    capacity: usize,
}

impl PoseHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        PoseHistory {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.trim_to_capacity();
    }

    /// Append a sample. A robot standing still does not flood the history:
    /// a pose equal to the latest one is skipped.
    pub fn push(&mut self, pose: &Pose, t: f64) {
        let sample = PoseSample::new(pose, t);
        if self.samples.back().is_some_and(|last| last.same_pose(&sample)) {
            return;
        }
        self.samples.push_back(sample);
        self.trim_to_capacity();
    }

    pub fn latest(&self) -> Option<&PoseSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoseSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn to_vec(&self) -> Vec<PoseSample> {
        self.samples.iter().copied().collect()
    }

    fn trim_to_capacity(&mut self) {
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }
}

impl Default for PoseHistory {
    fn default() -> Self {
        Self::new(2048)
    }
}
