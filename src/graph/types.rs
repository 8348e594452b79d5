use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Output option key for the video codec
pub const VIDEO_CODEC: &str = "c:v";
/// Output option key for the constant rate factor (quality)
pub const QUALITY_CRF: &str = "crf";
/// Output option key for the audio channel count
pub const AUDIO_CHANNELS: &str = "ac";
/// Output option key for the frame rate mode
pub const FRAME_RATE_MODE: &str = "fps_mode";
/// Output option key for the output frame rate
pub const FRAME_RATE: &str = "r";

/// Frame rate mode value forcing a constant frame rate
pub const CONSTANT_FRAME_RATE: &str = "cfr";

/// A scalar value for an ffmpeg option or filter argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Integer(i64),
    Float(f64),
    String(String),
}

impl OptionValue {
    /// Parse a command line value, preferring numbers over strings
    pub fn parse(raw: &str) -> Self {
        if let Ok(value) = raw.parse::<i64>() {
            Self::Integer(value)
        } else if let Ok(value) = raw.parse::<f64>() {
            Self::Float(value)
        } else {
            Self::String(raw.to_string())
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Output options passed to ffmpeg as `-key value`, keyed without the dash
///
/// Keys are kept sorted so the rendered command line is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputOptions {
    options: BTreeMap<String, OptionValue>,
}

impl OutputOptions {
    /// Create an empty option set
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode settings used when the caller does not override them:
    /// H.264 at CRF 18.
    pub fn encode_defaults() -> Self {
        Self::new().set(VIDEO_CODEC, "libx264").set(QUALITY_CRF, 18)
    }

    /// Set an option value
    pub fn set<K: Into<String>, V: Into<OptionValue>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert<K: Into<String>, V: Into<OptionValue>>(&mut self, key: K, value: V) {
        self.options.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    /// Returns `self` with every entry of `overrides` written over it
    pub fn merged_with(mut self, overrides: &OutputOptions) -> Self {
        for (key, value) in &overrides.options {
            self.options.insert(key.clone(), value.clone());
        }
        self
    }

    /// Parse a `key=value` pair as given on the command line
    pub fn parse_pair(pair: &str) -> Option<(String, OptionValue)> {
        let (key, value) = pair.split_once('=')?;
        let key = key.trim().trim_start_matches('-');
        if key.is_empty() {
            return None;
        }
        Some((key.to_string(), OptionValue::parse(value.trim())))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for OutputOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (key, value) in iter {
            options.insert(key, value);
        }
        options
    }
}

/// Kind of elementary stream selected from an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    fn specifier(self) -> &'static str {
        match self {
            Self::Video => "v",
            Self::Audio => "a",
        }
    }
}

/// Reference to a stream flowing through the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRef {
    /// A sub-stream of one of the graph inputs, e.g. `0:v`
    Input { index: usize, kind: StreamKind },
    /// The labelled output of a filter node, e.g. `[s0]`
    Label(String),
}

impl StreamRef {
    pub fn video(index: usize) -> Self {
        Self::Input { index, kind: StreamKind::Video }
    }

    pub fn audio(index: usize) -> Self {
        Self::Input { index, kind: StreamKind::Audio }
    }

    /// Form used as a filter pad, always bracketed
    pub fn pad(&self) -> String {
        match self {
            Self::Input { index, kind } => format!("[{}:{}]", index, kind.specifier()),
            Self::Label(label) => format!("[{}]", label),
        }
    }

    /// Form used with `-map`
    pub fn map_specifier(&self) -> String {
        match self {
            Self::Input { index, kind } => format!("{}:{}", index, kind.specifier()),
            Self::Label(label) => format!("[{}]", label),
        }
    }
}

/// One input file, optionally skipping its first `start` seconds
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub path: PathBuf,
    pub start: Option<f64>,
}

impl InputSpec {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), start: None }
    }

    pub fn with_start(mut self, seconds: f64) -> Self {
        self.start = Some(seconds);
        self
    }
}

/// A named filter with keyword arguments and a single labelled output
#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
    pub name: String,
    pub inputs: Vec<StreamRef>,
    pub args: Vec<(String, OptionValue)>,
    pub output: String,
}

impl FilterNode {
    pub fn arg(&self, key: &str) -> Option<&OptionValue> {
        self.args.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// The single output of a graph
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub path: PathBuf,
    pub streams: Vec<StreamRef>,
    pub options: OutputOptions,
}

/// Declarative description of one ffmpeg job
///
/// Built once by [`FilterGraphBuilder`](super::FilterGraphBuilder) and then
/// only read, either to render a command line or to inspect in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    pub(crate) inputs: Vec<InputSpec>,
    pub(crate) filters: Vec<FilterNode>,
    pub(crate) output: OutputSpec,
    pub(crate) overwrite: bool,
}

impl FilterGraph {
    pub fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    pub fn filters(&self) -> &[FilterNode] {
        &self.filters
    }

    pub fn output(&self) -> &OutputSpec {
        &self.output
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// All filter nodes with the given filter name
    pub fn filters_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FilterNode> + 'a {
        self.filters.iter().filter(move |node| node.name == name)
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters_named(name).next().is_some()
    }
}
