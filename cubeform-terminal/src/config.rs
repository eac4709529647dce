//! TOML configuration for the terminal front end.
//!
//! Every field is optional; a missing file section falls back to defaults
//! matching the classic demo: 60 fps, 45 degree field of view, camera 10
//! units back, 90 deg/s rotation, 1 unit/s movement and 0.5/s scaling.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cubeform_core::Rates;
use serde::Deserialize;
use thiserror::Error;

use crate::camera::ProjectionMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub rates: RatesConfig,
    /// Write logs here instead of stderr.
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_fov_degrees")]
    pub fov_degrees: f32,
    #[serde(default = "default_camera_distance")]
    pub camera_distance: f32,
    #[serde(default)]
    pub projection: ProjectionMode,
    /// Start with filled faces instead of the wireframe.
    #[serde(default)]
    pub solid: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            fov_degrees: default_fov_degrees(),
            camera_distance: default_camera_distance(),
            projection: ProjectionMode::default(),
            solid: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// How long a key stays held after its last press or repeat, when the
    /// terminal cannot report releases.
    #[serde(default = "default_hold_timeout_ms")]
    pub hold_timeout_ms: u64,
    /// How long a fresh key stays held while waiting for its first
    /// auto-repeat. Should exceed the keyboard's initial repeat delay.
    #[serde(default = "default_repeat_delay_ms")]
    pub repeat_delay_ms: u64,
    /// Longest frame time, in seconds, fed to the transform update.
    #[serde(default = "default_max_frame_time")]
    pub max_frame_time: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            hold_timeout_ms: default_hold_timeout_ms(),
            repeat_delay_ms: default_repeat_delay_ms(),
            max_frame_time: default_max_frame_time(),
        }
    }
}

impl InputConfig {
    pub fn hold_timeout(&self) -> Duration {
        Duration::from_millis(self.hold_timeout_ms)
    }

    pub fn repeat_delay(&self) -> Duration {
        Duration::from_millis(self.repeat_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RatesConfig {
    #[serde(default = "default_rotate_rate")]
    pub rotate_degrees_per_sec: f32,
    #[serde(default = "default_translate_rate")]
    pub translate_units_per_sec: f32,
    #[serde(default = "default_scale_rate")]
    pub scale_rate_per_sec: f32,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            rotate_degrees_per_sec: default_rotate_rate(),
            translate_units_per_sec: default_translate_rate(),
            scale_rate_per_sec: default_scale_rate(),
        }
    }
}

impl From<&RatesConfig> for Rates {
    fn from(rates: &RatesConfig) -> Self {
        Rates {
            rotate_degrees_per_sec: rates.rotate_degrees_per_sec,
            translate_units_per_sec: rates.translate_units_per_sec,
            scale_rate_per_sec: rates.scale_rate_per_sec,
        }
    }
}

fn default_fps() -> u32 {
    60
}
fn default_fov_degrees() -> f32 {
    45.0
}
fn default_camera_distance() -> f32 {
    10.0
}
fn default_hold_timeout_ms() -> u64 {
    150
}
fn default_repeat_delay_ms() -> u64 {
    crate::keys::DEFAULT_REPEAT_DELAY.as_millis() as u64
}
fn default_max_frame_time() -> f32 {
    cubeform_core::scene::DEFAULT_MAX_FRAME_TIME
}
fn default_rotate_rate() -> f32 {
    90.0
}
fn default_translate_rate() -> f32 {
    1.0
}
fn default_scale_rate() -> f32 {
    0.5
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let display = &self.display;
        if display.fps == 0 {
            return Err(ConfigError::Invalid("display.fps must be positive".into()));
        }
        if !(display.fov_degrees > 0.0 && display.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "display.fov_degrees must be between 0 and 180, got {}",
                display.fov_degrees
            )));
        }
        if !(display.camera_distance > 0.0) {
            return Err(ConfigError::Invalid(
                "display.camera_distance must be positive".into(),
            ));
        }
        if self.input.hold_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "input.hold_timeout_ms must be positive".into(),
            ));
        }
        if self.input.repeat_delay_ms < self.input.hold_timeout_ms {
            return Err(ConfigError::Invalid(format!(
                "input.repeat_delay_ms ({}) must not be shorter than input.hold_timeout_ms ({})",
                self.input.repeat_delay_ms, self.input.hold_timeout_ms
            )));
        }
        if !(self.input.max_frame_time > 0.0) {
            return Err(ConfigError::Invalid(
                "input.max_frame_time must be positive".into(),
            ));
        }

        let rates = [
            ("rotate_degrees_per_sec", self.rates.rotate_degrees_per_sec),
            ("translate_units_per_sec", self.rates.translate_units_per_sec),
            ("scale_rate_per_sec", self.rates.scale_rate_per_sec),
        ];
        for (name, value) in rates {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "rates.{} must be positive, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    pub fn frame_time(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.display.fps))
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_toml_str(&text)
}
