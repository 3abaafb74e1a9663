use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::perf::MonitorConfig;
use crate::pool::DEFAULT_PREWARM;
use crate::quality::{QualityConfig, RenderSettings};

pub const CONFIG_ENV_VAR: &str = "REFLEX_CONFIG";
pub const CONFIG_FILE_NAME: &str = "reflex.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config json at {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub target_tps: u32,
    pub max_render_fps: Option<u32>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Reflex Trainer".to_string(),
            width: 1400,
            height: 900,
            target_tps: 120,
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub target_prewarm: usize,
    pub particle_prewarm: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            target_prewarm: DEFAULT_PREWARM,
            particle_prewarm: DEFAULT_PREWARM,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflexConfig {
    pub window: WindowConfig,
    pub monitor: MonitorConfig,
    pub quality: QualityConfig,
    pub pools: PoolConfig,
    pub render: RenderSettings,
}

impl ReflexConfig {
    /// Loads and validates `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "config_file_missing_using_defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = Self::from_json_str(&raw)?;
        info!(path = %path.display(), "config_loaded");
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let mut config: ReflexConfig = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|error| {
                let location = error.path().to_string();
                ConfigError::Parse {
                    location: if location.is_empty() {
                        ".".to_string()
                    } else {
                        location
                    },
                    source: error.into_inner(),
                }
            })?;
        config.render = config.render.sanitized();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let monitor = &self.monitor;
        let quality = &self.quality;

        if monitor.window_capacity == 0 {
            return Err(invalid("monitor.window_capacity", "must be at least 1"));
        }
        if !(monitor.target_fps.is_finite() && monitor.target_fps > 0.0) {
            return Err(invalid(
                "monitor.target_fps",
                format!("expected a positive number, got {}", monitor.target_fps),
            ));
        }
        if monitor.critical_fps_threshold > monitor.low_fps_threshold {
            return Err(invalid(
                "monitor.critical_fps_threshold",
                format!(
                    "{} exceeds low_fps_threshold {}",
                    monitor.critical_fps_threshold, monitor.low_fps_threshold
                ),
            ));
        }
        if quality.control_tick_frames == 0 {
            return Err(invalid("quality.control_tick_frames", "must be at least 1"));
        }
        if !(quality.recovery_ratio > 0.0 && quality.recovery_ratio <= 1.0) {
            return Err(invalid(
                "quality.recovery_ratio",
                format!("expected a value in (0, 1], got {}", quality.recovery_ratio),
            ));
        }
        if quality.tier_downgrade_fps >= quality.tier_upgrade_fps {
            return Err(invalid(
                "quality.tier_downgrade_fps",
                format!(
                    "{} must be below tier_upgrade_fps {}",
                    quality.tier_downgrade_fps, quality.tier_upgrade_fps
                ),
            ));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid("window", "width and height must be non-zero"));
        }
        if self.window.target_tps == 0 {
            return Err(invalid("window.target_tps", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}

/// `REFLEX_CONFIG` when set and non-empty, otherwise `<config_dir>/reflex.json`.
pub fn resolve_config_path(config_dir: &Path) -> PathBuf {
    match env::var(CONFIG_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
        _ => config_dir.join(CONFIG_FILE_NAME),
    }
}
