//! # Engine
//!
//! Runs a [`FilterGraph`] to completion. The default engine spawns ffmpeg
//! and blocks until it exits.

use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graph::FilterGraph;

/// Executes filter graphs
pub trait Engine {
    /// Run `graph` synchronously, failing if the job does not succeed
    fn run(&self, graph: &FilterGraph) -> Result<()>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn run(&self, graph: &FilterGraph) -> Result<()> {
        (**self).run(graph)
    }
}

/// [`Engine`] backed by the ffmpeg executable
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    program: String,
    loglevel: String,
    hide_banner: bool,
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl FfmpegEngine {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            program: config.ffmpeg.clone(),
            loglevel: config.loglevel.clone(),
            hide_banner: config.hide_banner,
        }
    }

    /// Check that the configured ffmpeg can be started
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Build the full process invocation for `graph`
    pub fn command(&self, graph: &FilterGraph) -> Command {
        let mut cmd = Command::new(&self.program);
        if self.hide_banner {
            cmd.arg("-hide_banner");
        }
        cmd.args(["-loglevel", self.loglevel.as_str()]);
        cmd.args(graph.to_args());
        cmd
    }
}

impl Engine for FfmpegEngine {
    fn run(&self, graph: &FilterGraph) -> Result<()> {
        info!("Running {} for {:?}", self.program, graph.output().path);
        debug!("{}", graph.command_line(&self.program));

        // No stdin: ffmpeg must never wait on an overwrite prompt.
        let output = self
            .command(graph)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(EngineError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }

        debug!("{} finished: {:?}", self.program, graph.output().path);
        Ok(())
    }
}
