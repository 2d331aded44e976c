//! Demo algorithms shipped with the binary.

mod range_cruiser;
mod wall_follower;

pub use range_cruiser::RangeCruiser;
pub use wall_follower::WallFollower;

use control::MouseAlgorithm;
use serde::{Deserialize, Serialize};

use crate::config::AlgorithmConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    WallFollower,
    RangeCruiser,
}

pub fn build_algorithm(config: &AlgorithmConfig) -> Box<dyn MouseAlgorithm> {
    match config.kind {
        AlgorithmKind::WallFollower => Box::new(WallFollower::new(config.max_moves, config.goal)),
        AlgorithmKind::RangeCruiser => {
            Box::new(RangeCruiser::new(config.cruise_seconds, config.cruise_speed))
        }
    }
}
