//! Application configuration
//!
//! One JSON document holds everything the binary needs. Every field has a
//! default, so a partial file (or no file at all) is valid.

use std::fs;
use std::path::Path;
use std::time::Duration;

use control::InterfaceError;
use mechanics::{EngineError, GridMaze, WallSegment};
use serde::{Deserialize, Serialize};
use simcore::{ConfigError, Direction, SimConfig};
use thiserror::Error;

use crate::algorithms::AlgorithmKind;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "maze-sim.json";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    ParseConfig {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown log level `{0}`")]
    LogLevel(String),
    #[error("max_run_seconds must be a non-negative number of seconds, got {0}")]
    MaxRunSeconds(f64),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to spawn algorithm thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("algorithm failed: {0}")]
    Algorithm(#[from] InterfaceError),
    #[error("algorithm thread panicked")]
    AlgorithmPanicked,
}

/// Maze layout: dimensions plus interior walls. The border is always closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    pub width: i32,
    pub height: i32,
    pub walls: Vec<WallSegment>,
}

impl Default for MazeConfig {
    fn default() -> Self {
        let wall = |x, y, side| WallSegment { x, y, side };
        MazeConfig {
            width: 4,
            height: 4,
            walls: vec![
                wall(0, 0, Direction::East),
                wall(0, 1, Direction::East),
                wall(1, 1, Direction::North),
                wall(2, 1, Direction::North),
                wall(2, 0, Direction::East),
                wall(1, 3, Direction::South),
                wall(3, 2, Direction::West),
            ],
        }
    }
}

impl MazeConfig {
    pub fn build(&self) -> GridMaze {
        GridMaze::from_walls(self.width, self.height, &self.walls)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Undo,
    Reset,
    Pause,
    Resume,
}

/// A user request replayed at a fixed time, standing in for keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedRequest {
    pub at_ms: u64,
    pub kind: RequestKind,
}

/// Settings for the demo algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmConfig {
    pub kind: AlgorithmKind,
    /// Wall follower stops after this many cell moves
    pub max_moves: usize,
    /// Wall follower stops on reaching this cell
    pub goal: Option<(i32, i32)>,
    /// Range cruiser runs for this long (s)
    pub cruise_seconds: f64,
    /// Range cruiser forward wheel speed (rad/s)
    pub cruise_speed: f64,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        AlgorithmConfig {
            kind: AlgorithmKind::WallFollower,
            max_moves: 64,
            goal: Some((3, 0)),
            cruise_seconds: 10.0,
            cruise_speed: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`
    pub log_level: String,
    /// Interval between rendered snapshots (ms)
    pub render_interval_ms: u64,
    /// Shut down after this long even if the algorithm is still running (s)
    pub max_run_seconds: Option<f64>,
    pub sim: SimConfig,
    pub maze: MazeConfig,
    pub algorithm: AlgorithmConfig,
    pub requests: Vec<ScriptedRequest>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_level: "info".to_string(),
            render_interval_ms: 500,
            max_run_seconds: Some(120.0),
            sim: SimConfig::default(),
            maze: MazeConfig::default(),
            algorithm: AlgorithmConfig::default(),
            requests: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| AppError::ReadConfig {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents).map_err(|err| match err {
            AppError::ParseConfig { source, .. } => AppError::ParseConfig {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(contents: &str) -> Result<Self, AppError> {
        serde_json::from_str(contents).map_err(|source| AppError::ParseConfig {
            path: "<inline>".to_string(),
            source,
        })
    }

    pub fn log_level(&self) -> Result<log::LevelFilter, AppError> {
        self.log_level
            .parse()
            .map_err(|_| AppError::LogLevel(self.log_level.clone()))
    }

    /// Wall-clock limit for the run, `None` for no limit.
    pub fn run_limit(&self) -> Result<Option<Duration>, AppError> {
        self.max_run_seconds
            .map(|seconds| {
                Duration::try_from_secs_f64(seconds).map_err(|_| AppError::MaxRunSeconds(seconds))
            })
            .transpose()
    }

    /// Check every section before anything is spawned.
    pub fn validate(&self) -> Result<(), AppError> {
        self.log_level()?;
        self.run_limit()?;
        self.sim.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechanics::{Cell, Maze};

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_level().unwrap(), log::LevelFilter::Info);
        assert_eq!(config.run_limit().unwrap(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_bad_run_limit_rejected() {
        let config = AppConfig::from_json(r#"{ "max_run_seconds": -1 }"#).unwrap();
        assert!(matches!(config.run_limit(), Err(AppError::MaxRunSeconds(s)) if s == -1.0));
        assert!(matches!(config.validate(), Err(AppError::MaxRunSeconds(_))));

        let config = AppConfig::from_json(r#"{ "max_run_seconds": 1e300 }"#).unwrap();
        assert!(matches!(config.validate(), Err(AppError::MaxRunSeconds(_))));

        let config = AppConfig::from_json(r#"{ "max_run_seconds": null }"#).unwrap();
        assert_eq!(config.run_limit().unwrap(), None);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "log_level": "debug",
                "sim": { "frame_rate": 120.0 },
                "maze": { "width": 2, "height": 3, "walls": [ { "x": 0, "y": 0, "side": "north" } ] },
                "algorithm": { "kind": "range_cruiser" },
                "requests": [ { "at_ms": 1500, "kind": "undo" } ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.sim.frame_rate, 120.0);
        assert_eq!(config.sim.sensors.len(), 3);
        assert_eq!(config.algorithm.kind, AlgorithmKind::RangeCruiser);
        assert_eq!(config.algorithm.max_moves, 64);
        assert_eq!(config.requests[0].kind, RequestKind::Undo);

        let maze = config.maze.build();
        assert_eq!((maze.width(), maze.height()), (2, 3));
        assert!(maze.is_wall(Cell::new(0, 1), Direction::South));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let config = AppConfig {
            log_level: "loud".into(),
            ..AppConfig::default()
        };
        assert!(matches!(config.log_level(), Err(AppError::LogLevel(_))));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            AppConfig::from_json("{ not json"),
            Err(AppError::ParseConfig { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(matches!(
            AppConfig::from_file("/nonexistent/maze-sim.json"),
            Err(AppError::ReadConfig { .. })
        ));
    }
}
