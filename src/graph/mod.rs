//! # Filter Graph Module
//!
//! An engine-agnostic description of one ffmpeg job: inputs with optional
//! start trims, filter nodes, and a single output. Building a graph is pure;
//! running it is the job of [`crate::engine`].

pub mod builder;
pub mod render;
pub mod types;

pub use builder::FilterGraphBuilder;
pub use types::{
    FilterGraph, FilterNode, InputSpec, OptionValue, OutputOptions, OutputSpec, StreamKind,
    StreamRef,
};
