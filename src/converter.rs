//! # Stereo Converter
//!
//! Decides which filter graph a conversion needs and hands it to an
//! [`Engine`]. Two jobs are supported:
//!
//! - re-encoding a 3D video from one stereo layout to another;
//! - stacking two single-view videos into one 3D video, with optional audio
//!   mixing and a start offset between the two views.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::{Engine, FfmpegEngine};
use crate::error::{ConverterError, Result};
use crate::graph::types::{AUDIO_CHANNELS, CONSTANT_FRAME_RATE, FRAME_RATE, FRAME_RATE_MODE};
use crate::graph::{FilterGraph, FilterGraphBuilder, InputSpec, OutputOptions, StreamRef};
use crate::layout::StereoLayout;
use crate::probe::{FfprobeProber, MediaProber, StreamInfo};

/// Name of ffmpeg's stereoscopic remapping filter
pub const STEREO3D_FILTER: &str = "stereo3d";
/// Name of ffmpeg's horizontal stacking filter
pub const HSTACK_FILTER: &str = "hstack";
/// Name of ffmpeg's audio merging filter
pub const AMERGE_FILTER: &str = "amerge";

/// Re-encode one 3D video into another stereo layout
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub input_layout: StereoLayout,
    pub output: PathBuf,
    pub output_layout: StereoLayout,
    /// Written over the converter's default encode options
    pub options: OutputOptions,
}

impl ConversionRequest {
    pub fn new<I, O>(
        input: I,
        input_layout: impl Into<StereoLayout>,
        output: O,
        output_layout: impl Into<StereoLayout>,
    ) -> Self
    where
        I: Into<PathBuf>,
        O: Into<PathBuf>,
    {
        Self {
            input: input.into(),
            input_layout: input_layout.into(),
            output: output.into(),
            output_layout: output_layout.into(),
            options: OutputOptions::new(),
        }
    }

    pub fn with_options(mut self, options: OutputOptions) -> Self {
        self.options = options;
        self
    }
}

/// Combine a left and a right view into one 3D video
///
/// Both inputs are expected to share frame size and a constant frame rate.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionRequest {
    pub left: PathBuf,
    pub right: PathBuf,
    pub use_audio_left: bool,
    pub use_audio_right: bool,
    pub output: PathBuf,
    pub output_layout: StereoLayout,
    /// Written over the converter's default encode options
    pub options: OutputOptions,
    /// Seconds the right view is delayed from the left; negative when the
    /// left view is the delayed one
    pub offset: f64,
    pub overwrite: bool,
}

impl CompositionRequest {
    pub fn new<L, R, O>(
        left: L,
        right: R,
        output: O,
        output_layout: impl Into<StereoLayout>,
    ) -> Self
    where
        L: Into<PathBuf>,
        R: Into<PathBuf>,
        O: Into<PathBuf>,
    {
        Self {
            left: left.into(),
            right: right.into(),
            use_audio_left: false,
            use_audio_right: false,
            output: output.into(),
            output_layout: output_layout.into(),
            options: OutputOptions::new(),
            offset: 0.0,
            overwrite: false,
        }
    }

    pub fn with_audio(mut self, use_left: bool, use_right: bool) -> Self {
        self.use_audio_left = use_left;
        self.use_audio_right = use_right;
        self
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_options(mut self, options: OutputOptions) -> Self {
        self.options = options;
        self
    }

    /// Start trims for the (left, right) inputs
    ///
    /// Only the view that starts earlier is trimmed, by `|offset|` seconds.
    pub fn start_trims(&self) -> (Option<f64>, Option<f64>) {
        if self.offset > 0.0 {
            (None, Some(self.offset))
        } else if self.offset < 0.0 {
            (Some(-self.offset), None)
        } else {
            (None, None)
        }
    }

    pub fn audio_selection(&self) -> AudioSelection {
        AudioSelection::from_flags(self.use_audio_left, self.use_audio_right)
    }
}

/// Which audio ends up in a composed video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSelection {
    None,
    Left,
    Right,
    /// Both tracks merged into one stereo stream
    Both,
}

impl AudioSelection {
    pub fn from_flags(left: bool, right: bool) -> Self {
        match (left, right) {
            (true, true) => Self::Both,
            (true, false) => Self::Left,
            (false, true) => Self::Right,
            (false, false) => Self::None,
        }
    }
}

/// Builds and runs stereo conversion jobs
///
/// The engine and prober are injected so graphs can be inspected without
/// spawning ffmpeg.
#[derive(Debug, Clone)]
pub struct StereoConverter<E = FfmpegEngine, P = FfprobeProber> {
    engine: E,
    prober: P,
    defaults: OutputOptions,
    check_input_geometry: bool,
}

impl StereoConverter<FfmpegEngine, FfprobeProber> {
    /// Converter using the ffmpeg and ffprobe executables named in `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            FfmpegEngine::from_config(&config.engine),
            FfprobeProber::from_config(&config.engine),
        )
        .with_defaults(config.output.defaults.clone())
        .with_input_geometry_check(config.validation.check_input_geometry)
    }
}

impl Default for StereoConverter<FfmpegEngine, FfprobeProber> {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl<E: Engine, P: MediaProber> StereoConverter<E, P> {
    pub fn new(engine: E, prober: P) -> Self {
        Self {
            engine,
            prober,
            defaults: OutputOptions::encode_defaults(),
            check_input_geometry: false,
        }
    }

    /// Replace the options every output starts from
    pub fn with_defaults(mut self, defaults: OutputOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Probe both inputs of a composition and refuse mismatched frame sizes
    /// or frame rates before running the engine
    pub fn with_input_geometry_check(mut self, enabled: bool) -> Self {
        self.check_input_geometry = enabled;
        self
    }

    /// Graph for a single-source layout conversion
    pub fn build_convert_graph(&self, request: &ConversionRequest) -> FilterGraph {
        let mut builder = FilterGraphBuilder::new();
        let input = builder.input(InputSpec::new(&request.input));

        let mut video = StreamRef::video(input);
        if request.input_layout != request.output_layout {
            video = remap(&mut builder, video, &request.input_layout, &request.output_layout);
        }

        let options = self.defaults.clone().merged_with(&request.options);
        builder.output(
            &request.output,
            vec![video, StreamRef::audio(input)],
            options,
            false,
        )
    }

    /// Graph for a two-source composition, given the left input's frame rate
    pub fn build_compose_graph(&self, request: &CompositionRequest, frame_rate: f64) -> FilterGraph {
        let mut builder = FilterGraphBuilder::new();
        let (left_start, right_start) = request.start_trims();
        let left = builder.input(InputSpec {
            path: request.left.clone(),
            start: left_start,
        });
        let right = builder.input(InputSpec {
            path: request.right.clone(),
            start: right_start,
        });

        let mut video = builder.filter(
            HSTACK_FILTER,
            vec![StreamRef::video(left), StreamRef::video(right)],
            vec![("inputs", 2), ("shortest", 1)],
        );

        let stacked_layout = StereoLayout::side_by_side_left();
        if request.output_layout != stacked_layout {
            video = remap(&mut builder, video, &stacked_layout, &request.output_layout);
        }

        let mut options = self.defaults.clone().merged_with(&request.options);

        let audio = match request.audio_selection() {
            AudioSelection::Both => {
                options.insert(AUDIO_CHANNELS, 2);
                Some(builder.filter(
                    AMERGE_FILTER,
                    vec![StreamRef::audio(left), StreamRef::audio(right)],
                    vec![("inputs", 2)],
                ))
            }
            AudioSelection::Left => Some(StreamRef::audio(left)),
            AudioSelection::Right => Some(StreamRef::audio(right)),
            AudioSelection::None => None,
        };

        // Always forced, even over caller options for the same keys.
        options.insert(FRAME_RATE_MODE, CONSTANT_FRAME_RATE);
        options.insert(FRAME_RATE, frame_rate);

        let streams = std::iter::once(video).chain(audio).collect();
        builder.output(&request.output, streams, options, request.overwrite)
    }

    /// Re-encode a 3D video into another stereo layout
    pub fn convert_3d(&self, request: &ConversionRequest) -> Result<()> {
        info!(
            "Converting {:?} ({}) -> {:?} ({})",
            request.input, request.input_layout, request.output, request.output_layout
        );

        let graph = self.build_convert_graph(request);
        debug!("Graph: {:?}", graph.filter_complex());
        self.engine.run(&graph)
    }

    /// Combine two views into one 3D video
    pub fn convert_2d_to_3d(&self, request: &CompositionRequest) -> Result<()> {
        info!(
            "Combining {:?} + {:?} -> {:?} ({}), offset {}s",
            request.left, request.right, request.output, request.output_layout, request.offset
        );

        let graph = self.plan_composition(request)?;
        debug!("Graph: {:?}", graph.filter_complex());
        self.engine.run(&graph)
    }

    /// Probe the inputs and build the composition graph without running it
    ///
    /// Runs the input check when it is enabled, so a dry run fails the same
    /// way a real run would.
    pub fn plan_composition(&self, request: &CompositionRequest) -> Result<FilterGraph> {
        let frame_rate = if self.check_input_geometry {
            self.check_inputs(&request.left, &request.right)?.frame_rate
        } else {
            self.prober.frame_rate(&request.left)?
        };
        debug!("Forcing constant frame rate of {} fps", frame_rate);

        if request.audio_selection() == AudioSelection::Both {
            warn!("Merging audio from both views; independently recorded tracks may echo");
        }

        Ok(self.build_compose_graph(request, frame_rate))
    }

    fn check_inputs(&self, left: &Path, right: &Path) -> Result<StreamInfo> {
        let left_info = self.prober.probe(left)?;
        let right_info = self.prober.probe(right)?;

        let same_size = left_info.width == right_info.width && left_info.height == right_info.height;
        let same_rate = (left_info.frame_rate - right_info.frame_rate).abs() < 1e-3;
        if !(same_size && same_rate) {
            return Err(ConverterError::InputMismatch {
                left: describe(&left_info),
                right: describe(&right_info),
            });
        }

        Ok(left_info)
    }
}

fn remap(
    builder: &mut FilterGraphBuilder,
    video: StreamRef,
    from: &StereoLayout,
    to: &StereoLayout,
) -> StreamRef {
    builder.filter(
        STEREO3D_FILTER,
        vec![video],
        vec![("in", from.as_str()), ("out", to.as_str())],
    )
}

fn describe(info: &StreamInfo) -> String {
    format!("{}x{} @ {} fps", info.width, info.height, info.frame_rate)
}

/// Re-encode a 3D video from `in_type` to `out_type` with ffmpeg
///
/// `out_options` are written over the default `libx264` / CRF 18 settings.
pub fn convert_3d<I: AsRef<Path>, O: AsRef<Path>>(
    in_video: I,
    in_type: &str,
    out_video: O,
    out_type: &str,
    out_options: &OutputOptions,
) -> Result<()> {
    let request = ConversionRequest::new(in_video.as_ref(), in_type, out_video.as_ref(), out_type)
        .with_options(out_options.clone());
    StereoConverter::<FfmpegEngine, FfprobeProber>::default().convert_3d(&request)
}

/// Combine two single-view videos into a 3D video of `out_type` with ffmpeg
///
/// `offset` is the number of seconds `in_video_right` is delayed from
/// `in_video_left` (negative for the other way round).
#[allow(clippy::too_many_arguments)]
pub fn convert_2d_to_3d<L: AsRef<Path>, R: AsRef<Path>, O: AsRef<Path>>(
    in_video_left: L,
    in_video_right: R,
    use_audio_left: bool,
    use_audio_right: bool,
    out_video: O,
    out_type: &str,
    out_options: &OutputOptions,
    offset: f64,
    overwrite: bool,
) -> Result<()> {
    let request = CompositionRequest::new(
        in_video_left.as_ref(),
        in_video_right.as_ref(),
        out_video.as_ref(),
        out_type,
    )
    .with_audio(use_audio_left, use_audio_right)
    .with_options(out_options.clone())
    .with_offset(offset)
    .with_overwrite(overwrite);
    StereoConverter::<FfmpegEngine, FfprobeProber>::default().convert_2d_to_3d(&request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EngineError, ProbeError};
    use crate::graph::types::{QUALITY_CRF, VIDEO_CODEC};
    use crate::graph::OptionValue;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingEngine {
        graphs: RefCell<Vec<FilterGraph>>,
    }

    impl Engine for RecordingEngine {
        fn run(&self, graph: &FilterGraph) -> Result<()> {
            self.graphs.borrow_mut().push(graph.clone());
            Ok(())
        }
    }

    impl RecordingEngine {
        fn single(&self) -> FilterGraph {
            let graphs = self.graphs.borrow();
            assert_eq!(graphs.len(), 1, "expected exactly one engine run");
            graphs[0].clone()
        }
    }

    struct FailingEngine;

    impl Engine for FailingEngine {
        fn run(&self, _graph: &FilterGraph) -> Result<()> {
            Err(EngineError::Spawn {
                program: "ffmpeg".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }
            .into())
        }
    }

    struct FixedProber {
        left: StreamInfo,
        right: StreamInfo,
        calls: Cell<usize>,
    }

    impl FixedProber {
        fn with_rate(frame_rate: f64) -> Self {
            let info = StreamInfo { width: 1920, height: 1080, frame_rate };
            Self { left: info, right: info, calls: Cell::new(0) }
        }
    }

    impl MediaProber for FixedProber {
        fn probe(&self, path: &Path) -> Result<StreamInfo> {
            self.calls.set(self.calls.get() + 1);
            if path == Path::new("R.mp4") {
                Ok(self.right)
            } else {
                Ok(self.left)
            }
        }
    }

    struct MissingFileProber;

    impl MediaProber for MissingFileProber {
        fn probe(&self, path: &Path) -> Result<StreamInfo> {
            Err(ProbeError::Failed {
                path: path.display().to_string(),
                stderr: "No such file or directory".to_string(),
            }
            .into())
        }
    }

    fn remaps(graph: &FilterGraph) -> Vec<(String, String)> {
        graph
            .filters_named(STEREO3D_FILTER)
            .map(|node| {
                (
                    node.arg("in").map(|v| v.to_string()).unwrap_or_default(),
                    node.arg("out").map(|v| v.to_string()).unwrap_or_default(),
                )
            })
            .collect()
    }

    fn compose(request: &CompositionRequest) -> FilterGraph {
        let engine = RecordingEngine::default();
        let converter = StereoConverter::new(&engine, FixedProber::with_rate(29.97));
        converter.convert_2d_to_3d(request).unwrap();
        engine.single()
    }

    #[test]
    fn test_convert_with_layout_change() {
        let engine = RecordingEngine::default();
        let converter = StereoConverter::new(&engine, FixedProber::with_rate(30.0));

        converter
            .convert_3d(&ConversionRequest::new("a.mp4", "sbsl", "b.mp4", "arcc"))
            .unwrap();
        let graph = engine.single();

        assert_eq!(graph.inputs(), &[InputSpec::new("a.mp4")]);
        assert_eq!(remaps(&graph), vec![("sbsl".to_string(), "arcc".to_string())]);
        assert_eq!(graph.filters().len(), 1);
        assert_eq!(
            graph.output().streams,
            vec![StreamRef::Label("s0".to_string()), StreamRef::audio(0)]
        );
        assert_eq!(graph.output().path, PathBuf::from("b.mp4"));
        assert_eq!(graph.output().options, OutputOptions::encode_defaults());
        assert!(!graph.overwrite());
    }

    #[test]
    fn test_convert_same_layout_is_passthrough() {
        let engine = RecordingEngine::default();
        let converter = StereoConverter::new(&engine, FixedProber::with_rate(30.0));

        converter
            .convert_3d(&ConversionRequest::new("a.mp4", "sbsl", "b.mp4", "sbsl"))
            .unwrap();
        let graph = engine.single();

        assert_eq!(graph.inputs().len(), 1);
        assert!(graph.filters().is_empty());
        assert_eq!(graph.output().streams, vec![StreamRef::video(0), StreamRef::audio(0)]);
        assert_eq!(graph.output().path, PathBuf::from("b.mp4"));
    }

    #[test]
    fn test_convert_merges_caller_options_over_defaults() {
        let converter = StereoConverter::new(RecordingEngine::default(), FixedProber::with_rate(30.0));
        let request = ConversionRequest::new("a.mp4", "abl", "b.mkv", "sbsl")
            .with_options(OutputOptions::new().set(QUALITY_CRF, 28).set("preset", "fast"));

        let graph = converter.build_convert_graph(&request);
        let options = &graph.output().options;

        assert_eq!(options.get(VIDEO_CODEC), Some(&OptionValue::from("libx264")));
        assert_eq!(options.get(QUALITY_CRF), Some(&OptionValue::Integer(28)));
        assert_eq!(options.get("preset"), Some(&OptionValue::from("fast")));
    }

    #[test]
    fn test_convert_does_not_probe() {
        let prober = FixedProber::with_rate(30.0);
        let converter = StereoConverter::new(RecordingEngine::default(), &prober);

        converter
            .convert_3d(&ConversionRequest::new("a.mp4", "sbsl", "b.mp4", "arcc"))
            .unwrap();
        assert_eq!(prober.calls.get(), 0);
    }

    #[test]
    fn test_compose_positive_offset_trims_right() {
        let request = CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "sbsl")
            .with_audio(true, false)
            .with_offset(2.0);
        let graph = compose(&request);

        assert_eq!(graph.inputs()[0], InputSpec::new("L.mp4"));
        assert_eq!(graph.inputs()[1], InputSpec::new("R.mp4").with_start(2.0));

        let stack: Vec<_> = graph.filters_named(HSTACK_FILTER).collect();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].inputs, vec![StreamRef::video(0), StreamRef::video(1)]);
        assert_eq!(stack[0].arg("inputs"), Some(&OptionValue::Integer(2)));
        assert_eq!(stack[0].arg("shortest"), Some(&OptionValue::Integer(1)));

        assert!(remaps(&graph).is_empty());
        assert!(!graph.has_filter(AMERGE_FILTER));
        assert_eq!(
            graph.output().streams,
            vec![StreamRef::Label("s0".to_string()), StreamRef::audio(0)]
        );

        let options = &graph.output().options;
        assert_eq!(options.get(FRAME_RATE_MODE), Some(&OptionValue::from("cfr")));
        assert_eq!(options.get(FRAME_RATE), Some(&OptionValue::Float(29.97)));
        assert!(!options.contains(AUDIO_CHANNELS));
    }

    #[test]
    fn test_compose_negative_offset_trims_left_and_merges_audio() {
        let request = CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "abrl")
            .with_audio(true, true)
            .with_offset(-1.5);
        let graph = compose(&request);

        assert_eq!(graph.inputs()[0], InputSpec::new("L.mp4").with_start(1.5));
        assert_eq!(graph.inputs()[1], InputSpec::new("R.mp4"));

        let merges: Vec<_> = graph.filters_named(AMERGE_FILTER).collect();
        assert_eq!(merges.len(), 1);
        assert_eq!(merges[0].inputs, vec![StreamRef::audio(0), StreamRef::audio(1)]);
        assert_eq!(merges[0].arg("inputs"), Some(&OptionValue::Integer(2)));
        assert_eq!(graph.output().options.get(AUDIO_CHANNELS), Some(&OptionValue::Integer(2)));

        assert_eq!(remaps(&graph), vec![("sbsl".to_string(), "abrl".to_string())]);
        let remap_node = graph.filters_named(STEREO3D_FILTER).next().unwrap();
        assert_eq!(remap_node.inputs, vec![StreamRef::Label("s0".to_string())]);

        assert_eq!(
            graph.output().streams,
            vec![StreamRef::Label("s1".to_string()), StreamRef::Label("s2".to_string())]
        );
    }

    #[test]
    fn test_compose_without_audio() {
        let graph = compose(&CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "sbsl"));

        assert_eq!(graph.output().streams, vec![StreamRef::Label("s0".to_string())]);
        assert!(!graph.has_filter(AMERGE_FILTER));
        assert!(graph.inputs().iter().all(|input| input.start.is_none()));
        assert!(!graph.overwrite());
    }

    #[test]
    fn test_compose_right_audio_only() {
        let request = CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "sbsl").with_audio(false, true);
        let graph = compose(&request);

        assert_eq!(
            graph.output().streams,
            vec![StreamRef::Label("s0".to_string()), StreamRef::audio(1)]
        );
        assert!(!graph.output().options.contains(AUDIO_CHANNELS));
    }

    #[test]
    fn test_audio_selection_covers_all_flags() {
        assert_eq!(AudioSelection::from_flags(true, true), AudioSelection::Both);
        assert_eq!(AudioSelection::from_flags(true, false), AudioSelection::Left);
        assert_eq!(AudioSelection::from_flags(false, true), AudioSelection::Right);
        assert_eq!(AudioSelection::from_flags(false, false), AudioSelection::None);
    }

    #[test]
    fn test_exactly_one_side_trimmed() {
        for offset in [-3.25, -0.5, 0.0, 0.04, 10.0] {
            let request = CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "sbsl").with_offset(offset);
            let (left, right) = request.start_trims();

            if offset == 0.0 {
                assert_eq!((left, right), (None, None));
            } else {
                assert!(left.is_some() ^ right.is_some(), "offset {}", offset);
                assert_eq!(left.or(right), Some(offset.abs()));
            }
        }
    }

    #[test]
    fn test_forced_frame_rate_overrides_caller() {
        let request = CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "sbsl")
            .with_audio(true, true)
            .with_options(
                OutputOptions::new()
                    .set(FRAME_RATE_MODE, "vfr")
                    .set(FRAME_RATE, 60)
                    .set(AUDIO_CHANNELS, 6)
                    .set(QUALITY_CRF, 20),
            );
        let graph = compose(&request);
        let options = &graph.output().options;

        assert_eq!(options.get(FRAME_RATE_MODE), Some(&OptionValue::from("cfr")));
        assert_eq!(options.get(FRAME_RATE), Some(&OptionValue::Float(29.97)));
        assert_eq!(options.get(AUDIO_CHANNELS), Some(&OptionValue::Integer(2)));
        assert_eq!(options.get(QUALITY_CRF), Some(&OptionValue::Integer(20)));
        assert_eq!(options.get(VIDEO_CODEC), Some(&OptionValue::from("libx264")));
    }

    #[test]
    fn test_overwrite_is_forwarded() {
        let request = CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "sbsl").with_overwrite(true);
        let graph = compose(&request);

        assert!(graph.overwrite());
        assert_eq!(graph.to_args().last().map(|a| a.to_string_lossy().into_owned()), Some("-y".to_string()));
    }

    #[test]
    fn test_defaults_not_shared_between_calls() {
        let engine = RecordingEngine::default();
        let converter = StereoConverter::new(&engine, FixedProber::with_rate(25.0));

        converter
            .convert_2d_to_3d(&CompositionRequest::new("L.mp4", "R.mp4", "a.mp4", "sbsl").with_audio(true, true))
            .unwrap();
        converter
            .convert_3d(&ConversionRequest::new("in.mp4", "sbsl", "b.mp4", "arcc"))
            .unwrap();

        let graphs = engine.graphs.borrow();
        let second = &graphs[1].output().options;
        assert!(!second.contains(AUDIO_CHANNELS));
        assert!(!second.contains(FRAME_RATE_MODE));
        assert!(!second.contains(FRAME_RATE));
    }

    #[test]
    fn test_probe_failure_stops_before_engine() {
        let engine = RecordingEngine::default();
        let converter = StereoConverter::new(&engine, MissingFileProber);

        let result = converter.convert_2d_to_3d(&CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "sbsl"));

        assert!(matches!(result, Err(ConverterError::Probe(ProbeError::Failed { .. }))));
        assert!(engine.graphs.borrow().is_empty());
    }

    #[test]
    fn test_engine_failure_propagates() {
        let converter = StereoConverter::new(FailingEngine, FixedProber::with_rate(30.0));

        let convert = converter.convert_3d(&ConversionRequest::new("a.mp4", "sbsl", "b.mp4", "bogus"));
        assert!(matches!(convert, Err(ConverterError::Engine(EngineError::Spawn { .. }))));

        let compose = converter.convert_2d_to_3d(&CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "sbsl"));
        assert!(matches!(compose, Err(ConverterError::Engine(EngineError::Spawn { .. }))));
    }

    #[test]
    fn test_geometry_check_rejects_mismatch() {
        let engine = RecordingEngine::default();
        let mut prober = FixedProber::with_rate(30.0);
        prober.right.width = 1280;
        prober.right.height = 720;
        let converter = StereoConverter::new(&engine, prober).with_input_geometry_check(true);

        let result = converter.convert_2d_to_3d(&CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "sbsl"));

        assert!(matches!(result, Err(ConverterError::InputMismatch { .. })));
        assert!(engine.graphs.borrow().is_empty());
    }

    #[test]
    fn test_mismatch_ignored_without_check() {
        let engine = RecordingEngine::default();
        let mut prober = FixedProber::with_rate(30.0);
        prober.right.frame_rate = 24.0;
        let converter = StereoConverter::new(&engine, &prober);

        converter
            .convert_2d_to_3d(&CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "sbsl"))
            .unwrap();

        assert_eq!(engine.graphs.borrow().len(), 1);
        assert_eq!(prober.calls.get(), 1);
    }

    #[test]
    fn test_geometry_check_passes_matching_inputs() {
        let engine = RecordingEngine::default();
        let converter = StereoConverter::new(&engine, FixedProber::with_rate(50.0)).with_input_geometry_check(true);

        converter
            .convert_2d_to_3d(&CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "sbsl"))
            .unwrap();

        let graph = engine.single();
        assert_eq!(graph.output().options.get(FRAME_RATE), Some(&OptionValue::Float(50.0)));
    }

    #[test]
    fn test_plan_composition_runs_geometry_check() {
        let engine = RecordingEngine::default();
        let mut prober = FixedProber::with_rate(30.0);
        prober.right.frame_rate = 25.0;
        let converter = StereoConverter::new(&engine, prober).with_input_geometry_check(true);

        let result = converter.plan_composition(&CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "sbsl"));

        assert!(matches!(result, Err(ConverterError::InputMismatch { .. })));
        assert!(engine.graphs.borrow().is_empty());
    }

    #[test]
    fn test_plan_composition_does_not_run_engine() {
        let engine = RecordingEngine::default();
        let prober = FixedProber::with_rate(24.0);
        let converter = StereoConverter::new(&engine, &prober);
        let request = CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "arcc").with_audio(true, false);

        let graph = converter.plan_composition(&request).unwrap();

        assert!(engine.graphs.borrow().is_empty());
        assert_eq!(prober.calls.get(), 1);
        assert_eq!(graph, converter.build_compose_graph(&request, 24.0));
    }

    #[test]
    fn test_custom_defaults() {
        let converter = StereoConverter::new(RecordingEngine::default(), FixedProber::with_rate(30.0))
            .with_defaults(OutputOptions::new().set(VIDEO_CODEC, "libx265"));

        let graph = converter.build_convert_graph(&ConversionRequest::new("a.mp4", "sbsl", "b.mp4", "sbsl"));
        assert_eq!(graph.output().options, OutputOptions::new().set(VIDEO_CODEC, "libx265"));
    }

    #[test]
    fn test_rendered_composition() {
        let converter = StereoConverter::new(RecordingEngine::default(), FixedProber::with_rate(30.0));
        let request = CompositionRequest::new("L.mp4", "R.mp4", "out.mp4", "arcc")
            .with_audio(true, true)
            .with_offset(0.5);

        let graph = converter.build_compose_graph(&request, 30.0);
        assert_eq!(
            graph.filter_complex().as_deref(),
            Some(
                "[0:v][1:v]hstack=inputs=2:shortest=1[s0];\
                 [s0]stereo3d=in=sbsl:out=arcc[s1];\
                 [0:a][1:a]amerge=inputs=2[s2]"
            )
        );
    }
}
