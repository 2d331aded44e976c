//! Simulation parameters
//!
//! Read-only configuration consumed by the physics engine, the robot model
//! and the control interface. Loaded once at startup (see the `app` crate)
//! and validated before anything is spawned.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::ConfigError;

/// Configuration for a single range sensor mounted on the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Name algorithms pass to `read`
    pub name: String,
    /// Mounting angle relative to the heading, counter-clockwise positive (degrees)
    pub angle_deg: f64,
    /// Maximum measurable distance (m)
    pub range: f64,
    /// Declared time a read is allowed to take (ms)
    pub read_latency_ms: f64,
    /// Standard deviation of additive Gaussian noise (m), 0 disables noise
    pub noise_std_dev: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            name: "front".to_string(),
            angle_deg: 0.0,
            range: 0.5,
            read_latency_ms: 2.0,
            noise_std_dev: 0.0,
        }
    }
}

impl SensorConfig {
    pub fn new(name: impl Into<String>, angle_deg: f64) -> Self {
        SensorConfig {
            name: name.into(),
            angle_deg,
            ..Default::default()
        }
    }

    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }

    pub fn with_read_latency_ms(mut self, latency_ms: f64) -> Self {
        self.read_latency_ms = latency_ms;
        self
    }

    pub fn with_noise(mut self, std_dev: f64) -> Self {
        self.noise_std_dev = std_dev;
        self
    }

    /// Declared latency; zero when `read_latency_ms` is not representable
    /// (rejected by [`SimConfig::validate`]).
    pub fn read_latency(&self) -> Duration {
        Duration::try_from_secs_f64(self.read_latency_ms.max(0.0) / 1000.0).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Physics tick rate and sensor read pacing rate (Hz)
    pub frame_rate: f64,
    /// Length of a maze wall segment between posts (m)
    pub wall_length: f64,
    /// Thickness of a maze wall (m)
    pub wall_width: f64,
    /// Drive wheel radius (m)
    pub wheel_radius: f64,
    /// Distance between left and right wheel contact points (m)
    pub track_width: f64,
    /// Wheel speed commands are clamped to +/- this value (rad/s)
    pub max_wheel_speed: f64,
    /// Pause after mode declaration before algorithm control begins (ms)
    pub stabilization_delay_ms: u64,
    /// Warn when a sensor read takes longer than its declared latency
    pub print_late_sensor_reads: bool,
    /// Number of pose samples kept for the renderer
    pub history_capacity: usize,
    /// Most ticks the physics thread runs in one wakeup after falling behind
    pub max_catch_up_ticks: u32,
    /// Starting cell (x, y)
    pub initial_cell: (i32, i32),
    /// Starting heading
    pub initial_direction: Direction,
    pub sensors: Vec<SensorConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            frame_rate: 60.0,
            wall_length: 0.168,
            wall_width: 0.012,
            wheel_radius: 0.02,
            track_width: 0.08,
            max_wheel_speed: 100.0,
            stabilization_delay_ms: 250,
            print_late_sensor_reads: true,
            history_capacity: 2048,
            max_catch_up_ticks: 5,
            initial_cell: (0, 0),
            initial_direction: Direction::North,
            sensors: vec![
                SensorConfig::new("front", 0.0),
                SensorConfig::new("left", 90.0),
                SensorConfig::new("right", -90.0),
            ],
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_walls(mut self, wall_length: f64, wall_width: f64) -> Self {
        self.wall_length = wall_length;
        self.wall_width = wall_width;
        self
    }

    pub fn with_drive(mut self, wheel_radius: f64, track_width: f64) -> Self {
        self.wheel_radius = wheel_radius;
        self.track_width = track_width;
        self
    }

    pub fn with_stabilization_delay_ms(mut self, delay_ms: u64) -> Self {
        self.stabilization_delay_ms = delay_ms;
        self
    }

    pub fn with_start(mut self, cell: (i32, i32), direction: Direction) -> Self {
        self.initial_cell = cell;
        self.initial_direction = direction;
        self
    }

    pub fn with_sensors(mut self, sensors: Vec<SensorConfig>) -> Self {
        self.sensors = sensors;
        self
    }

    /// Distance between adjacent cell centers (m).
    pub fn cell_pitch(&self) -> f64 {
        self.wall_length + self.wall_width
    }

    /// Fixed physics tick interval in seconds.
    pub fn tick_seconds(&self) -> f64 {
        1.0 / self.frame_rate
    }

    /// Tick period; zero when the frame rate is invalid (rejected by
    /// [`SimConfig::validate`]).
    pub fn tick_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.tick_seconds()).unwrap_or_default()
    }

    pub fn stabilization_delay(&self) -> Duration {
        Duration::from_millis(self.stabilization_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let period = Duration::try_from_secs_f64(self.tick_seconds());
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) || period.is_err() {
            return Err(ConfigError::FrameRate(self.frame_rate));
        }

        let lengths = [
            ("wall length", self.wall_length),
            ("wheel radius", self.wheel_radius),
            ("track width", self.track_width),
        ];
        for (name, value) in lengths {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveLength { name, value });
            }
        }
        if !(self.wall_width.is_finite() && self.wall_width >= 0.0) {
            return Err(ConfigError::NonPositiveLength {
                name: "wall width",
                value: self.wall_width,
            });
        }

        if !(self.max_wheel_speed.is_finite() && self.max_wheel_speed > 0.0) {
            return Err(ConfigError::MaxWheelSpeed(self.max_wheel_speed));
        }

        let mut names = HashSet::new();
        for sensor in &self.sensors {
            if !names.insert(sensor.name.as_str()) {
                return Err(ConfigError::DuplicateSensor(sensor.name.clone()));
            }
            if !(sensor.range.is_finite() && sensor.range > 0.0) {
                return Err(ConfigError::Sensor {
                    name: sensor.name.clone(),
                    reason: format!("range must be positive, got {}", sensor.range),
                });
            }
            let latency = Duration::try_from_secs_f64(sensor.read_latency_ms / 1000.0);
            if !sensor.read_latency_ms.is_finite() || latency.is_err() {
                return Err(ConfigError::Sensor {
                    name: sensor.name.clone(),
                    reason: format!(
                        "read latency must be a non-negative duration, got {} ms",
                        sensor.read_latency_ms
                    ),
                });
            }
            if sensor.noise_std_dev < 0.0 || !sensor.noise_std_dev.is_finite() {
                return Err(ConfigError::Sensor {
                    name: sensor.name.clone(),
                    reason: format!("noise must be non-negative, got {}", sensor.noise_std_dev),
                });
            }
        }

        Ok(())
    }
}
