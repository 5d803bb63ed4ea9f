//! Configuration Management

use crate::analysis::warp_trigger::WarpThresholds;
use crate::capture::ring_buffer::DEFAULT_CAPACITY;
use crate::capture::trajectory_window::{DEFAULT_WINDOW_SIZE, MIN_WINDOW_SIZE};
use crate::engine::warp_engine::{EngineSettings, DEFAULT_CAPTURE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Trigger thresholds
    #[serde(default)]
    pub warp: WarpConfig,
    /// Sample history
    #[serde(default)]
    pub trajectory: TrajectoryConfig,
    /// Target refinement
    #[serde(default)]
    pub saliency: SaliencyConfig,
    /// Input queue and worker
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Warp trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// Heading tolerance (degrees)
    pub angle_deg: f64,
    /// Minimum travel across the window (pixels)
    pub distance_px: f64,
    /// Cursor closer than this to the fixation is left alone (pixels)
    pub home_radius_px: f64,
}

/// Trajectory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Samples kept in the window
    pub window_size: usize,
    /// Cursor polling period expected from the sampler (ms)
    pub poll_interval_ms: u64,
}

/// Saliency configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaliencyConfig {
    pub enabled: bool,
    /// Side of the square region captured around a target (pixels)
    pub capture_size_px: u32,
}

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Input queue size
    pub queue_capacity: usize,
}

impl Default for WarpConfig {
    fn default() -> Self {
        let thresholds = WarpThresholds::default();
        Self {
            angle_deg: thresholds.angle_deg(),
            distance_px: thresholds.distance_px(),
            home_radius_px: thresholds.home_radius_px(),
        }
    }
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            poll_interval_ms: 20,
        }
    }
}

impl Default for SaliencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capture_size_px: DEFAULT_CAPTURE_SIZE,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.thresholds()?;
        if self.trajectory.window_size < MIN_WINDOW_SIZE {
            return Err(crate::Error::Config(format!(
                "window_size must be >= {}, got {}",
                MIN_WINDOW_SIZE, self.trajectory.window_size
            )));
        }
        if self.trajectory.poll_interval_ms == 0 {
            return Err(crate::Error::Config("poll_interval_ms must be > 0".to_string()));
        }
        if self.saliency.capture_size_px < 4 || self.saliency.capture_size_px > 2048 {
            return Err(crate::Error::Config(format!(
                "capture_size_px must be in [4, 2048], got {}",
                self.saliency.capture_size_px
            )));
        }
        let capacity = self.worker.queue_capacity;
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(crate::Error::Config(format!(
                "queue_capacity must be a power of 2, got {}",
                capacity
            )));
        }
        Ok(())
    }

    /// Trigger thresholds from the `[warp]` section
    pub fn thresholds(&self) -> Result<WarpThresholds, crate::Error> {
        WarpThresholds::new(
            self.warp.angle_deg,
            self.warp.distance_px,
            self.warp.home_radius_px,
        )
    }

    /// Engine settings from the `[warp]` and `[trajectory]` sections
    pub fn engine_settings(&self) -> Result<EngineSettings, crate::Error> {
        Ok(EngineSettings {
            thresholds: self.thresholds()?,
            window_size: self.trajectory.window_size,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.trajectory.poll_interval_ms)
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".gaze_warp").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
