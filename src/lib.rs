//! # framestream
//!
//! Convert videos into raw RGB frame streams for lightweight players.
//!
//! `framestream` decodes a video with FFmpeg (via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate), resizes
//! every frame to a fixed width with the source aspect ratio preserved, and
//! writes the frames uncompressed after a 16-byte header:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | render width (`u32` LE) |
//! | 4 | 4 | render height (`u32` LE) |
//! | 8 | 4 | declared frame count (`u32` LE) |
//! | 12 | 4 | frame rate (`f32` LE) |
//! | 16 | W×H×3 per frame | RGB8 frame records, row-major |
//!
//! The declared frame count comes from the container and may overstate what
//! actually decodes; compare it with the file size (see
//! [`FrameStreamReader`]) to detect a short stream.
//!
//! ## Quick Start
//!
//! ### Convert a Video
//!
//! ```no_run
//! use framestream::ConvertOptions;
//!
//! let report = framestream::convert("input.mp4", "frames.data", &ConvertOptions::new())?;
//! if report.is_truncated() {
//!     eprintln!("{} frames missing", report.missing_frames());
//! }
//! # Ok::<(), framestream::FrameStreamError>(())
//! ```
//!
//! ### Read a Stream Back
//!
//! ```no_run
//! use framestream::FrameStreamReader;
//!
//! let reader = FrameStreamReader::open("frames.data")?;
//! for frame in reader {
//!     let frame = frame?;
//!     println!("{:?}", frame.pixel(0, 0));
//! }
//! # Ok::<(), framestream::FrameStreamError>(())
//! ```
//!
//! ### Extract the Audio Track
//!
//! ```no_run
//! use framestream::{AudioExtractor, Toolchain};
//!
//! AudioExtractor::new(Toolchain::default()).extract("input.mp4", "audio.mp3")?;
//! # Ok::<(), framestream::FrameStreamError>(())
//! ```
//!
//! ## Features
//!
//! - **Streaming conversion**: one frame in memory at a time, regardless of
//!   video length
//! - **Pluggable sources**: anything implementing [`FrameSource`] can be
//!   converted, not only video files
//! - **Configurable resampling**: nearest, bilinear, Catmull-Rom, Gaussian,
//!   or Lanczos
//! - **Progress & cancellation**: batched callbacks and a
//!   [`CancellationToken`]
//! - **Atomic output**: optionally write to a `.part` file and rename on
//!   success
//! - **Inspection & validation**: read streams back and check them against
//!   their header
//! - **Audio extraction & transcoding** through the `ffmpeg` executable
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed to build. Audio extraction
//! and transcoding additionally need an `ffmpeg` executable at run time.

pub mod audio;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod header;
pub mod logging;
pub mod metadata;
pub mod normalize;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod reader;
pub mod source;
pub mod toolchain;
mod utilities;
pub mod validation;
pub mod writer;

pub use audio::{AudioExtractor, AudioFormat};
pub use config::{ConvertOptions, ResizeFilter};
pub use error::FrameStreamError;
pub use frame::{ChannelOrder, FrameBuffer, SourceFrame};
pub use geometry::{BYTES_PER_PIXEL, DEFAULT_RENDER_WIDTH, TargetGeometry};
pub use header::{FileHeader, HEADER_LEN};
pub use logging::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use metadata::{AudioMetadata, MediaMetadata, VideoMetadata};
pub use normalize::FrameNormalizer;
pub use pipeline::{
    Conversion, ConversionReport, PipelineState, convert, convert_source, convert_to_writer,
};
pub use probe::MediaProbe;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use reader::FrameStreamReader;
pub use source::{FrameSource, VideoSource};
pub use toolchain::{Toolchain, TranscodeOptions};
pub use validation::{ValidationReport, validate_source, validate_source_at, validate_stream_file};
pub use writer::{StreamWriter, write_stream};
