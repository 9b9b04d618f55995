//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Culling group sizing, LOD thresholds and execution.
    pub culling: CullingConfig,
    /// Reference camera.
    pub camera: CameraConfig,
    /// Demo scene population and run length.
    pub demo: DemoConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Culling group configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CullingConfig {
    /// Maximum number of registered volumes.
    pub capacity: usize,
    /// Descending viewport-height thresholds. Empty means a single LOD.
    pub lod_thresholds: Vec<f32>,
    /// Run the culling pass and the diff on the worker pool.
    pub parallel: bool,
    /// Volumes per parallel work item.
    pub chunk_size: usize,
    /// Worker threads including the caller (0 = one per logical CPU).
    pub worker_count: usize,
}

/// Reference camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Width over height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Horizontal distance of the orbiting camera from the scene center.
    pub orbit_radius: f32,
    /// Camera height above the ground plane.
    pub orbit_height: f32,
    /// Orbit angular speed in degrees per second.
    pub orbit_speed_deg_s: f32,
}

/// Demo scene configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of volumes to spawn.
    pub instance_count: usize,
    /// Grid spacing along x.
    pub x_step: f32,
    /// Grid spacing along z, applied each time a row wraps.
    pub z_step: f32,
    /// Row length along x before wrapping.
    pub x_max: f32,
    /// Maximum random vertical offset in either direction.
    pub y_jitter: f32,
    /// RNG seed for the scene layout.
    pub seed: u64,
    /// Frames to simulate before exiting.
    pub frames: u32,
    /// Simulated seconds per frame.
    pub frame_dt: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Frames between statistics reports (0 = never).
    pub report_interval: u32,
}

// --- Default implementations ---

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            capacity: 4096,
            lod_thresholds: vec![1.0, 0.5, 0.25, 0.025],
            parallel: true,
            chunk_size: 64,
            worker_count: 0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.3,
            far: 1000.0,
            orbit_radius: 60.0,
            orbit_height: 8.0,
            orbit_speed_deg_s: 20.0,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            instance_count: 2500,
            x_step: 2.5,
            z_step: 10.0,
            x_max: 200.0,
            y_jitter: 0.5,
            seed: 42,
            frames: 600,
            frame_dt: 1.0 / 60.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            report_interval: 60,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Platform config directory (`<config>/nebula-culling`), or the working
    /// directory when the platform has none.
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nebula-culling")
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(config_dir)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let write_error = |source| ConfigError::Write {
            path: config_path.clone(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_error)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(write_error)
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(config_dir)?;
        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Read { path, source })?;
        ron::from_str(&contents).map_err(ConfigError::Parse)
    }
}
