use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    graph::OutputOptions,
};

/// Main configuration for the 3D video converter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External ffmpeg/ffprobe settings
    pub engine: EngineConfig,

    /// Output encode settings
    pub output: OutputConfig,

    /// Optional input checks
    pub validation: ValidationConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        Ok(())
    }
}

/// Settings for the external programs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// ffmpeg executable, looked up on PATH when not absolute
    pub ffmpeg: String,

    /// ffprobe executable, looked up on PATH when not absolute
    pub ffprobe: String,

    /// Value for ffmpeg's `-loglevel`
    pub loglevel: String,

    /// Pass `-hide_banner` to ffmpeg
    pub hide_banner: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            loglevel: "error".to_string(),
            hide_banner: true,
        }
    }
}

impl EngineConfig {
    const LOG_LEVELS: &'static [&'static str] = &[
        "quiet", "panic", "fatal", "error", "warning", "info", "verbose", "debug", "trace",
    ];

    fn validate(&self) -> Result<()> {
        if self.ffmpeg.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "engine.ffmpeg".to_string(),
                value: self.ffmpeg.clone()
            }.into());
        }

        if self.ffprobe.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "engine.ffprobe".to_string(),
                value: self.ffprobe.clone()
            }.into());
        }

        if !Self::LOG_LEVELS.contains(&self.loglevel.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "engine.loglevel".to_string(),
                value: self.loglevel.clone()
            }.into());
        }

        Ok(())
    }
}

/// Output encode configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Options every output starts from; per-call options are written over these
    pub defaults: OutputOptions,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            defaults: OutputOptions::encode_defaults(),
        }
    }
}

/// Checks run before the engine starts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Probe both inputs of a composition and refuse mismatched dimensions
    pub check_input_geometry: bool,
}
