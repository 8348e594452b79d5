use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use video_converter_3d::{
    CompositionRequest, Config, ConversionRequest, ConverterError, OptionValue, OutputOptions,
    StereoConverter, StereoLayout,
};

#[derive(Parser)]
#[command(
    name = "video-converter-3d",
    version,
    about = "Convert 3D videos between stereo layouts, or combine two views into one 3D video",
    long_about = "Builds ffmpeg filter graphs to re-encode stereoscopic videos into another layout (see https://ffmpeg.org/ffmpeg-filters.html#stereo3d) or to stack two separate left/right videos into a 3D video."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print the ffmpeg command instead of running it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a 3D video to a different stereo layout
    Convert {
        /// Input 3D video
        input: PathBuf,

        /// Stereo layout of the input (e.g. sbsl)
        in_type: StereoLayout,

        /// Output video file path
        output: PathBuf,

        /// Stereo layout of the output (e.g. arcc)
        out_type: StereoLayout,

        /// Extra ffmpeg output option, as key=value (repeatable)
        #[arg(short = 'O', long = "option", value_parser = parse_option)]
        options: Vec<(String, OptionValue)>,
    },

    /// Combine separate left and right videos into a 3D video
    Combine {
        /// Left view video
        left: PathBuf,

        /// Right view video
        right: PathBuf,

        /// Output video file path
        output: PathBuf,

        /// Stereo layout of the output (e.g. sbsl)
        out_type: StereoLayout,

        /// Keep the audio of the left video
        #[arg(long)]
        audio_left: bool,

        /// Keep the audio of the right video
        #[arg(long)]
        audio_right: bool,

        /// Seconds the right video is delayed from the left (negative for the reverse)
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        offset: f64,

        /// Overwrite the output file if it exists
        #[arg(short = 'y', long)]
        overwrite: bool,

        /// Extra ffmpeg output option, as key=value (repeatable)
        #[arg(short = 'O', long = "option", value_parser = parse_option)]
        options: Vec<(String, OptionValue)>,
    },

    /// List the stereo layouts ffmpeg documents
    Layouts,
}

fn friendly(err: ConverterError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

fn parse_option(raw: &str) -> Result<(String, OptionValue), String> {
    OutputOptions::parse_pair(raw).ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    // Load configuration
    let config = match cli.config {
        Some(ref config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path).map_err(friendly)?
        }
        None => Config::default(),
    };

    let converter = StereoConverter::from_config(&config);

    match cli.command {
        Command::Layouts => {
            for (token, description) in StereoLayout::KNOWN {
                println!("{:<6} {}", token, description);
            }
        }

        Command::Convert { input, in_type, output, out_type, options } => {
            let request = ConversionRequest::new(input, in_type, output, out_type)
                .with_options(options.into_iter().collect());

            if cli.dry_run {
                let graph = converter.build_convert_graph(&request);
                println!("{}", graph.command_line(&config.engine.ffmpeg));
                return Ok(());
            }

            tokio::task::spawn_blocking(move || converter.convert_3d(&request))
                .await
                .context("conversion task panicked")?
                .map_err(friendly)?;
            info!("Conversion complete");
        }

        Command::Combine {
            left,
            right,
            output,
            out_type,
            audio_left,
            audio_right,
            offset,
            overwrite,
            options,
        } => {
            let request = CompositionRequest::new(left, right, output, out_type)
                .with_audio(audio_left, audio_right)
                .with_offset(offset)
                .with_overwrite(overwrite)
                .with_options(options.into_iter().collect());

            if cli.dry_run {
                let graph = converter.plan_composition(&request).map_err(friendly)?;
                println!("{}", graph.command_line(&config.engine.ffmpeg));
                return Ok(());
            }

            tokio::task::spawn_blocking(move || converter.convert_2d_to_3d(&request))
                .await
                .context("composition task panicked")?
                .map_err(friendly)?;
            info!("Composition complete");
        }
    }

    Ok(())
}
