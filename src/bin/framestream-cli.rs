use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framestream::{
    AudioExtractor, AudioFormat, ConversionReport, ConvertOptions, FfmpegLogLevel,
    FrameStreamReader, MediaMetadata, MediaProbe, ProgressCallback, ProgressInfo, ResizeFilter,
    TargetGeometry, Toolchain, TranscodeOptions, DEFAULT_RENDER_WIDTH,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framestream convert frame.mp4 run/frames.data --progress\n  framestream probe frame.mp4 --json\n  framestream inspect run/frames.data --frame 0 --png first.png\n  framestream extract-audio frame.mp4 --out run/audio.mp3\n  framestream transcode audio.m4a run/audio.mp3 --audio-codec libmp3lame --bitrate 192k --no-video\n  framestream completions zsh > _framestream";

#[derive(Debug, Parser)]
#[command(
    name = "framestream",
    version,
    about = "Convert videos into raw RGB frame streams, and extract their audio",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Path to the ffmpeg executable used for audio extraction and transcoding.
    #[arg(long, global = true)]
    ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a video into a frame stream file.
    #[command(
        about = "Convert a video into a frame stream",
        after_help = "Examples:\n  framestream convert frame.mp4 run/frames.data\n  framestream convert frame.mp4 out.data --width 80 --filter nearest --atomic"
    )]
    Convert {
        /// Input video path.
        input: PathBuf,
        /// Output frame stream path.
        output: PathBuf,
        /// Render width in pixels; the height follows the source aspect ratio.
        #[arg(long, default_value_t = DEFAULT_RENDER_WIDTH)]
        width: u32,
        /// Resize filter: nearest | triangle | catmull-rom | gaussian | lanczos3.
        #[arg(long, default_value = "triangle")]
        filter: String,
        /// Write to `<output>.part` and rename once complete.
        #[arg(long)]
        atomic: bool,
    },

    /// Print metadata for a media file.
    #[command(
        about = "Print media metadata",
        visible_alias = "info",
        after_help = "Examples:\n  framestream probe frame.mp4\n  framestream probe frame.mp4 --json"
    )]
    Probe {
        /// Input media path.
        input: PathBuf,
        /// Render width used to preview the output geometry.
        #[arg(long, default_value_t = DEFAULT_RENDER_WIDTH)]
        width: u32,
        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Inspect and validate a frame stream file.
    #[command(
        about = "Inspect a frame stream",
        after_help = "Examples:\n  framestream inspect run/frames.data\n  framestream inspect run/frames.data --frame 10 --png frame10.png"
    )]
    Inspect {
        /// Frame stream path.
        file: PathBuf,
        /// Output the header and validation report as JSON.
        #[arg(long)]
        json: bool,
        /// Frame index to export.
        #[arg(long, requires = "png")]
        frame: Option<u64>,
        /// Image path for the exported frame.
        #[arg(long, requires = "frame")]
        png: Option<PathBuf>,
    },

    /// Extract the audio track of a video.
    #[command(
        about = "Extract audio track",
        after_help = "Examples:\n  framestream extract-audio frame.mp4 --out run/audio.mp3\n  framestream extract-audio frame.mp4 --format flac"
    )]
    ExtractAudio {
        /// Input video path.
        input: PathBuf,
        /// Output file path. Defaults to the input with the format's extension.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output format: mp3 | aac | flac | wav.
        #[arg(long, default_value = "mp3")]
        format: String,
        /// Bit rate for lossy formats.
        #[arg(long, default_value = framestream::audio::DEFAULT_AUDIO_BITRATE)]
        bitrate: String,
    },

    /// Convert one media file into another with the ffmpeg executable.
    #[command(
        about = "Transcode with ffmpeg",
        after_help = "Examples:\n  framestream transcode audio.m4a audio.mp3 --audio-codec libmp3lame --bitrate 192k --no-video"
    )]
    Transcode {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        audio_codec: Option<String>,
        #[arg(long)]
        bitrate: Option<String>,
        #[arg(long)]
        video_codec: Option<String>,
        #[arg(long)]
        no_video: bool,
    },

    /// Check that the ffmpeg executable runs.
    #[command(about = "Check the ffmpeg executable")]
    CheckToolchain,

    /// Generate shell completion script.
    #[command(
        about = "Generate shell completions",
        after_help = "Examples:\n  framestream completions bash > framestream.bash\n  framestream completions zsh > _framestream"
    )]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if global.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    let ffmpeg_level = match &global.log_level {
        Some(level) => Some(
            level
                .parse::<FfmpegLogLevel>()
                .map_err(|_| format!("unsupported --log-level: {level}"))?,
        ),
        None if global.verbose => Some(FfmpegLogLevel::from_level_filter(LevelFilter::Info)),
        None => None,
    };
    if let Some(level) = ffmpeg_level {
        framestream::set_ffmpeg_log_level(level);
    }
    Ok(())
}

fn toolchain(global: &GlobalOptions) -> Toolchain {
    global
        .ffmpeg
        .as_ref()
        .map_or_else(Toolchain::default, Toolchain::new)
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

/// Drives an indicatif bar from conversion progress.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        if let Some(remaining) = info.estimated_remaining {
            self.bar.set_message(format!("eta {}s", remaining.as_secs()));
        }
    }
}

fn print_conversion(report: &ConversionReport) {
    let output = report
        .output
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "wrote {} frame(s) at {}x{} to {} ({} bytes, {:.2?})",
            report.frames_written,
            report.header.render_width,
            report.header.render_height,
            output,
            report.stream_len(),
            report.elapsed,
        )
        .green()
    );
    if report.is_truncated() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!(
                "source ended after {} of {} declared frames; the header still declares {}",
                report.frames_written, report.declared_frames, report.header.frame_count
            )
            .yellow()
        );
    }
}

fn metadata_json(metadata: &MediaMetadata, width: u32) -> serde_json::Value {
    json!({
        "format": metadata.format,
        "duration_seconds": metadata.duration.as_secs_f64(),
        "video": metadata.video.as_ref().map(|video| json!({
            "width": video.width,
            "height": video.height,
            "fps": video.frames_per_second,
            "frame_count": video.frame_count,
            "frame_count_is_estimate": video.frame_count_is_estimate,
            "codec": video.codec,
            "render": TargetGeometry::resolve(width, video.width, video.height)
                .ok()
                .map(|geometry| json!([geometry.render_width, geometry.render_height])),
        })),
        "audio": metadata.audio.as_ref().map(|audio| json!({
            "sample_rate": audio.sample_rate,
            "channels": audio.channels,
            "codec": audio.codec,
            "bit_rate": audio.bit_rate,
        })),
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global)?;

    match cli.command {
        Commands::Convert {
            input,
            output,
            width,
            filter,
            atomic,
        } => {
            let filter = filter.parse::<ResizeFilter>()?;
            ensure_writable_path(&output, cli.global.overwrite)?;

            let mut options = ConvertOptions::new()
                .with_render_width(width)
                .with_resize_filter(filter)
                .with_atomic_output(atomic);

            let progress = if cli.global.progress {
                let progress = Arc::new(BarProgress::new()?);
                options = options.with_progress(progress.clone());
                Some(progress)
            } else {
                None
            };

            let result = framestream::convert(&input, &output, &options);
            if let Some(progress) = progress {
                progress.bar.finish_and_clear();
            }
            print_conversion(&result?);
        }

        Commands::Probe { input, width, json } => {
            let metadata = MediaProbe::probe(&input)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&metadata_json(&metadata, width))?
                );
            } else {
                println!("Format: {}", metadata.format);
                println!("Duration: {:?}", metadata.duration);
                if let Some(video) = &metadata.video {
                    println!(
                        "Video: {}x{} @ {:.2} fps, {}{} frames [{}]",
                        video.width,
                        video.height,
                        video.frames_per_second,
                        if video.frame_count_is_estimate { "~" } else { "" },
                        video.frame_count,
                        video.codec,
                    );
                    print!("{}", framestream::validate_source_at(video, width));
                }
                if let Some(audio) = &metadata.audio {
                    println!(
                        "Audio: {} Hz, {} ch [{}]",
                        audio.sample_rate, audio.channels, audio.codec,
                    );
                }
            }
        }

        Commands::Inspect {
            file,
            json,
            frame,
            png,
        } => {
            let report = framestream::validate_stream_file(&file)?;
            let mut reader = FrameStreamReader::open(&file)?;
            let header = *reader.header();

            if json {
                let payload = json!({
                    "render_width": header.render_width,
                    "render_height": header.render_height,
                    "declared_frames": header.frame_count,
                    "frame_rate": header.frame_rate,
                    "frames_present": reader.frames_present(),
                    "trailing_bytes": reader.trailing_bytes(),
                    "truncated": reader.is_truncated(),
                    "valid": report.is_valid(),
                    "warnings": report.warnings,
                    "errors": report.errors,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print!("{report}");
            }

            if let (Some(index), Some(png)) = (frame, png) {
                ensure_writable_path(&png, cli.global.overwrite)?;
                if index >= reader.frames_present() {
                    return Err(format!(
                        "frame {index} out of range ({} present)",
                        reader.frames_present()
                    )
                    .into());
                }
                let buffer = reader
                    .nth(index as usize)
                    .ok_or_else(|| format!("frame {index} could not be read"))??;
                buffer.into_image()?.save(&png)?;
                println!("{} {}", "saved".green().bold(), png.display());
            }
        }

        Commands::ExtractAudio {
            input,
            out,
            format,
            bitrate,
        } => {
            let format = format.parse::<AudioFormat>()?;
            let extractor = AudioExtractor::new(toolchain(&cli.global))
                .with_format(format)
                .with_bitrate(bitrate);
            let out = out.unwrap_or_else(|| extractor.default_output_for(&input));
            ensure_writable_path(&out, cli.global.overwrite)?;
            extractor.extract(&input, &out)?;
            println!("{} {}", "saved".green().bold(), out.display());
        }

        Commands::Transcode {
            input,
            output,
            audio_codec,
            bitrate,
            video_codec,
            no_video,
        } => {
            ensure_writable_path(&output, cli.global.overwrite)?;
            let mut options = TranscodeOptions::new().no_video(no_video);
            if let Some(codec) = audio_codec {
                options = options.audio_codec(codec);
            }
            if let Some(bitrate) = bitrate {
                options = options.audio_bitrate(bitrate);
            }
            if let Some(codec) = video_codec {
                options = options.video_codec(codec);
            }

            let toolchain = toolchain(&cli.global);
            toolchain.probe()?;
            toolchain.transcode(&input, &output, &options)?;
            println!("{} {}", "saved".green().bold(), output.display());
        }

        Commands::CheckToolchain => {
            let toolchain = toolchain(&cli.global);
            let banner = toolchain.probe()?;
            println!(
                "{} {} ({})",
                "ok:".green().bold(),
                banner,
                toolchain.program().display()
            );
        }

        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framestream", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
