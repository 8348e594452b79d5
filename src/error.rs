use std::process::ExitStatus;

use thiserror::Error;

/// Main error type for the 3D video converter
#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("ffmpeg error: {0}")]
    Engine(#[from] EngineError),

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input videos do not match: left is {left}, right is {right}")]
    InputMismatch { left: String, right: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported while running the filter graph engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Errors reported while reading stream metadata
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to probe {path}: {stderr}")]
    Failed { path: String, stderr: String },

    #[error("Invalid probe output for {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("No video stream found in {path}")]
    NoVideoStream { path: String },

    #[error("Invalid frame rate '{value}' in {path}")]
    InvalidFrameRate { path: String, value: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using ConverterError
pub type Result<T> = std::result::Result<T, ConverterError>;

impl ConverterError {
    /// Exit status reported by ffmpeg, if the engine ran and failed
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self {
            Self::Engine(EngineError::Failed { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Engine(EngineError::Spawn { program, .. })
            | Self::Probe(ProbeError::Spawn { program, .. }) => {
                format!("Could not run '{}'. Please check that FFmpeg is installed and on PATH.", program)
            }
            Self::Probe(ProbeError::Failed { path, .. }) => {
                format!("Could not read video file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
