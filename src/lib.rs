//! # Video Converter 3D
//!
//! FFmpeg-based tool for converting either two separate stereo videos or an
//! existing 3D video into a wide range of 3D video formats.
//!
//! The crate only builds filter graphs and runs ffmpeg; decoding, filtering
//! and encoding all happen in the external process.
//!
//! ## Quick Start
//!
//! Convert a full-width parallel view video to full color red/cyan anaglyph:
//!
//! ```rust,no_run
//! use video_converter_3d::{convert_3d, OutputOptions};
//!
//! # fn main() -> video_converter_3d::Result<()> {
//! convert_3d("parallel.mp4", "sbsl", "anaglyph.mp4", "arcc", &OutputOptions::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! Combine two views, where the right camera started recording 1.2s late:
//!
//! ```rust,no_run
//! use video_converter_3d::{CompositionRequest, StereoConverter};
//!
//! # fn main() -> video_converter_3d::Result<()> {
//! let request = CompositionRequest::new("left.mp4", "right.mp4", "3d.mp4", "sbsl")
//!     .with_audio(true, false)
//!     .with_offset(1.2)
//!     .with_overwrite(true);
//!
//! let converter: StereoConverter = StereoConverter::default();
//! converter.convert_2d_to_3d(&request)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`converter`] - Decides which graph a request needs
//! - [`graph`] - Declarative filter graph and its ffmpeg rendering
//! - [`engine`] - Runs graphs with ffmpeg
//! - [`probe`] - Reads frame rate and size with ffprobe
//! - [`layout`] - Stereo layout tokens
//! - [`config`] - Configuration management
//!
//! Stereo layouts follow ffmpeg's `stereo3d` filter; see
//! <https://ffmpeg.org/ffmpeg-filters.html#stereo3d>.

pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod graph;
pub mod layout;
pub mod probe;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    converter::{
        convert_2d_to_3d, convert_3d, AudioSelection, CompositionRequest, ConversionRequest,
        StereoConverter,
    },
    engine::{Engine, FfmpegEngine},
    error::{ConverterError, Result},
    graph::{FilterGraph, OptionValue, OutputOptions},
    layout::StereoLayout,
    probe::{FfprobeProber, MediaProber},
};
