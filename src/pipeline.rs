//! The conversion pipeline.
//!
//! A [`Conversion`] owns one [`FrameSource`] and drives it through
//! `Idle → GeometryResolved → Writing → {Completed | Aborted}`, pulling,
//! normalizing and appending one frame at a time. Memory use is bounded by a
//! single frame regardless of video length.
//!
//! Most callers want one of the entry points:
//!
//! - [`convert`]: open a video file and write a frame stream file.
//! - [`convert_source`]: the same, from any [`FrameSource`].
//! - [`convert_to_writer`]: write the stream to any [`io::Write`](Write).
//!
//! # Example
//!
//! ```no_run
//! use framestream::ConvertOptions;
//!
//! let report = framestream::convert("input.mp4", "frames.data", &ConvertOptions::new())?;
//! println!(
//!     "{}x{}: {} of {} frames",
//!     report.header.render_width,
//!     report.header.render_height,
//!     report.frames_written,
//!     report.declared_frames,
//! );
//! # Ok::<(), framestream::FrameStreamError>(())
//! ```

use std::{
    ffi::OsString,
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use crate::{
    config::ConvertOptions,
    error::FrameStreamError,
    geometry::TargetGeometry,
    header::FileHeader,
    normalize::FrameNormalizer,
    progress::{OperationType, ProgressTracker},
    source::{FrameSource, VideoSource},
    writer::StreamWriter,
};

/// Lifecycle of a [`Conversion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Source opened, nothing derived yet.
    Idle,
    /// Render geometry and header are known.
    GeometryResolved,
    /// Frames are being appended.
    Writing,
    /// Every declared frame was written, or the source ended cleanly.
    Completed,
    /// A decode, normalize, or write error occurred, or the conversion was
    /// cancelled.
    Aborted,
}

impl PipelineState {
    /// Returns `true` for [`Completed`](Self::Completed) and
    /// [`Aborted`](Self::Aborted).
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Aborted)
    }
}

/// Outcome of a finished conversion.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// The header written at offset 0.
    pub header: FileHeader,
    /// Frame records actually written.
    pub frames_written: u64,
    /// Frame count the source declared.
    pub declared_frames: u64,
    /// Destination file, or `None` when writing to an arbitrary writer.
    pub output: Option<PathBuf>,
    /// Wall-clock time spent converting.
    pub elapsed: Duration,
}

impl ConversionReport {
    /// Returns `true` if the source ended before its declared frame count.
    pub fn is_truncated(&self) -> bool {
        self.frames_written < self.declared_frames
    }

    /// Declared frames that never made it into the stream.
    pub fn missing_frames(&self) -> u64 {
        self.declared_frames.saturating_sub(self.frames_written)
    }

    /// Size in bytes of the stream that was written.
    pub fn stream_len(&self) -> u64 {
        self.header.stream_len(self.frames_written)
    }
}

/// Per-conversion context: the source, its derived geometry, and the write
/// cursor.
///
/// ```
/// use framestream::{
///     ChannelOrder, Conversion, ConvertOptions, FrameSource, FrameStreamError, PipelineState,
///     SourceFrame, StreamWriter,
/// };
///
/// struct Solid(u64);
///
/// impl FrameSource for Solid {
///     fn frame_count(&self) -> u64 { 2 }
///     fn source_width(&self) -> u32 { 4 }
///     fn source_height(&self) -> u32 { 2 }
///     fn frame_rate(&self) -> f64 { 25.0 }
///     fn next_frame(&mut self) -> Result<Option<SourceFrame>, FrameStreamError> {
///         if self.0 == 0 {
///             return Ok(None);
///         }
///         self.0 -= 1;
///         Ok(Some(SourceFrame::new(vec![9; 4 * 2 * 3], 4, 2, ChannelOrder::Rgb)))
///     }
/// }
///
/// let options = ConvertOptions::new().with_render_width(8);
/// let mut conversion = Conversion::new(Solid(2), &options);
/// let header = conversion.prepare()?;
/// assert_eq!((header.render_width, header.render_height), (8, 4));
///
/// let mut writer = StreamWriter::new(Vec::new(), header)?;
/// assert_eq!(conversion.run(&mut writer)?, 2);
/// assert_eq!(conversion.state(), PipelineState::Completed);
/// # Ok::<(), FrameStreamError>(())
/// ```
pub struct Conversion<'a, S: FrameSource> {
    source: S,
    options: &'a ConvertOptions,
    normalizer: FrameNormalizer,
    state: PipelineState,
    header: Option<FileHeader>,
    frames_written: u64,
}

impl<'a, S: FrameSource> Conversion<'a, S> {
    /// Start a conversion over an opened source.
    pub fn new(source: S, options: &'a ConvertOptions) -> Self {
        Self {
            source,
            options,
            normalizer: FrameNormalizer::new(options.resize_filter()),
            state: PipelineState::Idle,
            header: None,
            frames_written: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The header, once geometry has been resolved.
    pub fn header(&self) -> Option<FileHeader> {
        self.header
    }

    /// Frame records written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Frame count the source declares.
    pub fn declared_frames(&self) -> u64 {
        self.source.frame_count()
    }

    /// Give the source back.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Resolve render geometry and build the header.
    ///
    /// Moves `Idle → GeometryResolved`. Calling again after success returns
    /// the same header.
    ///
    /// # Errors
    ///
    /// - [`FrameStreamError::GeometryUndetermined`] if the source reports a
    ///   zero dimension.
    /// - [`FrameStreamError::InvalidRenderWidth`] if the configured width is
    ///   zero.
    ///
    /// Either error moves the conversion to [`PipelineState::Aborted`].
    pub fn prepare(&mut self) -> Result<FileHeader, FrameStreamError> {
        if let Some(header) = self.header {
            return Ok(header);
        }
        if self.state != PipelineState::Idle {
            return Err(self.out_of_order("prepare"));
        }

        let geometry = TargetGeometry::resolve(
            self.options.render_width(),
            self.source.source_width(),
            self.source.source_height(),
        )
        .inspect_err(|_| self.state = PipelineState::Aborted)?;

        log::debug!(
            "Resolved render geometry {}x{} from source {}x{}",
            geometry.render_width,
            geometry.render_height,
            self.source.source_width(),
            self.source.source_height(),
        );

        let header = FileHeader::new(geometry, self.source.frame_count(), self.source.frame_rate());
        self.header = Some(header);
        self.state = PipelineState::GeometryResolved;
        Ok(header)
    }

    /// Pull, normalize, and append frames until the declared count is reached
    /// or the source ends.
    ///
    /// Moves `GeometryResolved → Writing → Completed`, or to `Aborted` on
    /// error. The writer must have been created with the header returned by
    /// [`prepare`](Self::prepare). Returns the number of frames written.
    ///
    /// # Errors
    ///
    /// - [`FrameStreamError::Cancelled`] if the cancellation token fires.
    /// - Any decode, normalize, or write error from the stages.
    pub fn run<W: Write>(&mut self, writer: &mut StreamWriter<W>) -> Result<u64, FrameStreamError> {
        let Some(header) = self.header.filter(|_| self.state == PipelineState::GeometryResolved)
        else {
            return Err(self.out_of_order("run"));
        };
        if writer.header().geometry() != header.geometry() {
            self.state = PipelineState::Aborted;
            return Err(FrameStreamError::FrameSizeMismatch {
                expected: header.frame_len(),
                actual: writer.header().frame_len(),
            });
        }

        self.state = PipelineState::Writing;
        let declared = self.source.frame_count();
        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::FrameConversion,
            Some(declared),
            self.options.batch_size,
        );

        match self.write_frames(writer, header.geometry(), declared, &mut tracker) {
            Ok(()) => {
                tracker.finish();
                self.state = PipelineState::Completed;
                Ok(self.frames_written)
            }
            Err(error) => {
                self.state = PipelineState::Aborted;
                log::debug!(
                    "Conversion aborted after {} frames: {error}",
                    self.frames_written
                );
                Err(error)
            }
        }
    }

    fn write_frames<W: Write>(
        &mut self,
        writer: &mut StreamWriter<W>,
        geometry: TargetGeometry,
        declared: u64,
        tracker: &mut ProgressTracker,
    ) -> Result<(), FrameStreamError> {
        while self.frames_written < declared {
            if self.options.is_cancelled() {
                return Err(FrameStreamError::Cancelled);
            }

            let Some(frame) = self.source.next_frame()? else {
                log::warn!(
                    "Source ended after {} of {} declared frames",
                    self.frames_written,
                    declared
                );
                return Ok(());
            };

            let buffer = self.normalizer.normalize(frame, geometry)?;
            writer.write_frame(&buffer)?;
            self.frames_written += 1;
            log::trace!("Wrote frame {}/{}", self.frames_written, declared);
            tracker.advance();
        }
        Ok(())
    }

    fn out_of_order(&self, step: &str) -> FrameStreamError {
        FrameStreamError::InvalidState(format!(
            "cannot {step} a conversion in state {:?}",
            self.state
        ))
    }

    fn abort(&mut self) {
        self.state = PipelineState::Aborted;
    }
}

/// Convert a video file into a frame stream file.
///
/// # Errors
///
/// - [`FrameStreamError::SourceUnavailable`] if `input` cannot be opened.
/// - Everything [`convert_source`] can return.
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConvertOptions,
) -> Result<ConversionReport, FrameStreamError> {
    let source = VideoSource::open(input)?;
    convert_source(source, output, options)
}

/// Convert frames from any source into a frame stream file.
///
/// Geometry is resolved before the destination is touched, so a source with
/// a zero dimension leaves no file behind. With
/// [atomic output](ConvertOptions::with_atomic_output) the stream goes to
/// `<output>.part` and is renamed into place only on completion.
///
/// # Errors
///
/// - [`FrameStreamError::GeometryUndetermined`] or
///   [`FrameStreamError::InvalidRenderWidth`] before any output exists.
/// - [`FrameStreamError::DestinationUnavailable`] if `output` cannot be
///   created.
/// - [`FrameStreamError::Cancelled`] or any stage error while writing.
pub fn convert_source<S: FrameSource, P: AsRef<Path>>(
    source: S,
    output: P,
    options: &ConvertOptions,
) -> Result<ConversionReport, FrameStreamError> {
    let started = Instant::now();
    let output = output.as_ref();
    let mut conversion = Conversion::new(source, options);
    let header = conversion.prepare()?;

    let target = if options.atomic_output {
        partial_path(output)
    } else {
        output.to_path_buf()
    };

    let mut writer = StreamWriter::create(&target, header).inspect_err(|_| conversion.abort())?;
    let outcome = conversion.run(&mut writer).and_then(|_| writer.finish());

    let frames_written = match outcome {
        Ok(frames_written) => frames_written,
        Err(error) => {
            if options.atomic_output {
                discard_partial(&target);
            }
            return Err(error);
        }
    };

    if options.atomic_output {
        fs::rename(&target, output).map_err(|error| {
            discard_partial(&target);
            FrameStreamError::DestinationUnavailable {
                path: output.to_path_buf(),
                reason: format!("cannot move {} into place: {error}", target.display()),
            }
        })?;
    }

    let report = ConversionReport {
        header,
        frames_written,
        declared_frames: conversion.declared_frames(),
        output: Some(output.to_path_buf()),
        elapsed: started.elapsed(),
    };
    log_completion(&report);
    Ok(report)
}

/// Convert frames from any source into an arbitrary writer.
///
/// The writer is used as-is; wrap files in a
/// [`BufWriter`](std::io::BufWriter) yourself.
///
/// # Errors
///
/// Same as [`convert_source`], minus the destination errors.
pub fn convert_to_writer<S: FrameSource, W: Write>(
    source: S,
    writer: W,
    options: &ConvertOptions,
) -> Result<ConversionReport, FrameStreamError> {
    let started = Instant::now();
    let mut conversion = Conversion::new(source, options);
    let header = conversion.prepare()?;

    let mut writer = StreamWriter::new(writer, header).inspect_err(|_| conversion.abort())?;
    conversion.run(&mut writer)?;
    let frames_written = writer.finish()?;

    let report = ConversionReport {
        header,
        frames_written,
        declared_frames: conversion.declared_frames(),
        output: None,
        elapsed: started.elapsed(),
    };
    log_completion(&report);
    Ok(report)
}

fn partial_path(output: &Path) -> PathBuf {
    let mut raw: OsString = output.as_os_str().to_os_string();
    raw.push(".part");
    PathBuf::from(raw)
}

fn discard_partial(path: &Path) {
    if let Err(error) = fs::remove_file(path) {
        log::warn!("Failed to remove partial output {}: {error}", path.display());
    }
}

fn log_completion(report: &ConversionReport) {
    log::info!(
        "Wrote {} of {} declared frames at {}x{} in {:.2?}",
        report.frames_written,
        report.declared_frames,
        report.header.render_width,
        report.header.render_height,
        report.elapsed,
    );
}
