//! # Media Probing
//!
//! Reads the few stream properties the converter needs (frame rate and frame
//! size) through `ffprobe`.

use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{ProbeError, Result};

/// Properties of the first video stream of a file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    /// Frames per second
    pub frame_rate: f64,
}

/// Source of stream metadata
pub trait MediaProber {
    /// Read the first video stream of `path`
    fn probe(&self, path: &Path) -> Result<StreamInfo>;

    /// Frames per second of the first video stream of `path`
    fn frame_rate(&self, path: &Path) -> Result<f64> {
        Ok(self.probe(path)?.frame_rate)
    }
}

impl<P: MediaProber + ?Sized> MediaProber for &P {
    fn probe(&self, path: &Path) -> Result<StreamInfo> {
        (**self).probe(path)
    }

    fn frame_rate(&self, path: &Path) -> Result<f64> {
        (**self).frame_rate(path)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    r_frame_rate: Option<String>,
    #[serde(default)]
    avg_frame_rate: Option<String>,
}

/// [`MediaProber`] backed by the `ffprobe` executable
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: String,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeProber {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self { program: program.into() }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.ffprobe.clone())
    }
}

impl MediaProber for FfprobeProber {
    fn probe(&self, path: &Path) -> Result<StreamInfo> {
        debug!("Probing {:?} with {}", path, self.program);

        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_streams",
                "-print_format",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ProbeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                path: path.display().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        let info = parse_probe_output(path, &output.stdout)?;
        debug!("{:?}: {}x{} @ {:.3} fps", path, info.width, info.height, info.frame_rate);
        Ok(info)
    }
}

/// Parse `ffprobe -show_streams -print_format json` output
pub fn parse_probe_output(path: &Path, json: &[u8]) -> Result<StreamInfo> {
    let parsed: ProbeOutput = serde_json::from_slice(json).map_err(|e| ProbeError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| ProbeError::NoVideoStream { path: path.display().to_string() })?;

    // Average rate first: on variable rate files `r_frame_rate` is the
    // timestamp base, not a usable frame rate.
    let frame_rate = [stream.avg_frame_rate.as_deref(), stream.r_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .find_map(parse_frame_rate)
        .ok_or_else(|| ProbeError::InvalidFrameRate {
            path: path.display().to_string(),
            value: stream
                .avg_frame_rate
                .clone()
                .or_else(|| stream.r_frame_rate.clone())
                .unwrap_or_default(),
        })?;

    Ok(StreamInfo {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        frame_rate,
    })
}

/// Parse a rate such as `30000/1001` or `25`; zero and non-finite rates are rejected
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let rate = match raw.trim().split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse().ok()?,
    };

    (rate.is_finite() && rate > 0.0).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConverterError;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.001);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("N/A"), None);
    }

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "streams": [
                {
                    "index": 0,
                    "codec_type": "video",
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "60/1",
                    "avg_frame_rate": "60/1"
                }
            ]
        }"#;

        let info = parse_probe_output(Path::new("left.mp4"), json).unwrap();
        assert_eq!(info, StreamInfo { width: 1920, height: 1080, frame_rate: 60.0 });
    }

    #[test]
    fn test_variable_rate_uses_average_rate() {
        let json = br#"{"streams": [{"width": 1080, "height": 1920, "r_frame_rate": "90000/1", "avg_frame_rate": "30000/1001"}]}"#;

        let info = parse_probe_output(Path::new("phone.mp4"), json).unwrap();
        assert!((info.frame_rate - 29.97).abs() < 0.001);
    }

    #[test]
    fn test_falls_back_to_real_base_rate() {
        let json = br#"{"streams": [{"width": 640, "height": 480, "r_frame_rate": "24000/1001", "avg_frame_rate": "0/0"}]}"#;

        let info = parse_probe_output(Path::new("clip.mkv"), json).unwrap();
        assert!((info.frame_rate - 23.976).abs() < 0.001);
    }

    #[test]
    fn test_no_video_stream() {
        let result = parse_probe_output(Path::new("audio.wav"), br#"{"streams": []}"#);
        assert!(matches!(
            result,
            Err(ConverterError::Probe(ProbeError::NoVideoStream { .. }))
        ));
    }

    #[test]
    fn test_unusable_rate() {
        let json = br#"{"streams": [{"r_frame_rate": "0/0"}]}"#;
        let result = parse_probe_output(Path::new("broken.mp4"), json);
        assert!(matches!(
            result,
            Err(ConverterError::Probe(ProbeError::InvalidFrameRate { ref value, .. })) if value == "0/0"
        ));
    }

    #[test]
    fn test_garbage_output() {
        let result = parse_probe_output(Path::new("x.mp4"), b"not json");
        assert!(matches!(result, Err(ConverterError::Probe(ProbeError::Parse { .. }))));
    }
}
