//! Source reading.
//!
//! [`FrameSource`] is the seam between the conversion pipeline and whatever
//! produces frames. [`VideoSource`] is the FFmpeg-backed implementation: it
//! owns one demuxer and one decoder over a single input file and yields
//! frames in decode order, one per [`next_frame`](FrameSource::next_frame)
//! call.
//!
//! # Example
//!
//! ```no_run
//! use framestream::{FrameSource, VideoSource};
//!
//! let mut source = VideoSource::open("input.mp4")?;
//! println!(
//!     "{}x{}, {} frames declared",
//!     source.source_width(),
//!     source.source_height(),
//!     source.frame_count()
//! );
//! while let Some(frame) = source.next_frame()? {
//!     println!("decoded {}x{}", frame.width, frame.height);
//! }
//! # Ok::<(), framestream::FrameStreamError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    error::EAGAIN,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{
    error::FrameStreamError,
    frame::{ChannelOrder, SourceFrame},
    geometry::BYTES_PER_PIXEL,
    metadata::{MediaMetadata, VideoMetadata},
    probe,
};

/// Consecutive unreadable packets tolerated before decoding gives up.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 64;

/// A producer of decoded frames with container-level properties.
///
/// All properties are available before the first frame is pulled. Frames are
/// yielded in decode order; `Ok(None)` signals end-of-stream, after which
/// every further call also returns `Ok(None)`.
pub trait FrameSource {
    /// Number of frames the container declares. May overstate what decodes.
    fn frame_count(&self) -> u64;

    /// Width of the source frames, in pixels.
    fn source_width(&self) -> u32;

    /// Height of the source frames, in pixels.
    fn source_height(&self) -> u32;

    /// Declared frame rate. Informational only.
    fn frame_rate(&self) -> f64;

    /// Pull the next decoded frame.
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FrameStreamError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn frame_count(&self) -> u64 {
        (**self).frame_count()
    }

    fn source_width(&self) -> u32 {
        (**self).source_width()
    }

    fn source_height(&self) -> u32 {
        (**self).source_height()
    }

    fn frame_rate(&self) -> f64 {
        (**self).frame_rate()
    }

    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FrameStreamError> {
        (**self).next_frame()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn frame_count(&self) -> u64 {
        (**self).frame_count()
    }

    fn source_width(&self) -> u32 {
        (**self).source_width()
    }

    fn source_height(&self) -> u32 {
        (**self).source_height()
    }

    fn frame_rate(&self) -> f64 {
        (**self).frame_rate()
    }

    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FrameStreamError> {
        (**self).next_frame()
    }
}

/// A decoding session over one video file.
///
/// Created via [`VideoSource::open`]. Frames come out at native resolution as
/// packed RGB; FFmpeg's software scaler converts from the decoder's native
/// pixel format without resizing. Dropping the source closes the decoder and
/// the file.
pub struct VideoSource {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: Option<ScalingContext>,
    video_stream_index: usize,
    metadata: MediaMetadata,
    video_metadata: VideoMetadata,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    frames_decoded: u64,
    eof_sent: bool,
    finished: bool,
    path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("path", &self.path)
            .field("video_stream_index", &self.video_stream_index)
            .field("video_metadata", &self.video_metadata)
            .field("frames_decoded", &self.frames_decoded)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file for decoding.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, selects the best
    /// video stream and reads its metadata. No frame is decoded yet.
    ///
    /// # Errors
    ///
    /// Returns [`FrameStreamError::SourceUnavailable`] if the file is
    /// missing, not a recognised container, has no video stream, or its
    /// codec has no decoder.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameStreamError> {
        let path = path.as_ref();
        log::debug!("Opening video source: {}", path.display());

        let input_context = probe::open_input(path)?;
        let metadata = probe::read_metadata(&input_context, path)?;

        let video_metadata = metadata
            .video
            .clone()
            .ok_or_else(|| probe::source_unavailable(path, "no video stream found"))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| probe::source_unavailable(path, "no video stream found"))?;
        let video_stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(|error| {
            probe::source_unavailable(path, format!("Failed to read codec parameters: {error}"))
        })?;
        let decoder = decoder_context.decoder().video().map_err(|error| {
            probe::source_unavailable(path, format!("Failed to create video decoder: {error}"))
        })?;

        log::info!(
            "Opened video source: {} ({}x{}, {:.2} fps, {} frames{}, codec={})",
            path.display(),
            video_metadata.width,
            video_metadata.height,
            video_metadata.frames_per_second,
            video_metadata.frame_count,
            if video_metadata.frame_count_is_estimate { " estimated" } else { "" },
            video_metadata.codec,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: None,
            video_stream_index,
            metadata,
            video_metadata,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            frames_decoded: 0,
            eof_sent: false,
            finished: false,
            path: path.to_path_buf(),
        })
    }

    /// Metadata read from the container at open time.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Metadata of the video stream being decoded.
    pub fn video_metadata(&self) -> &VideoMetadata {
        &self.video_metadata
    }

    /// Path this source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of frames decoded so far.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    fn exhausted(&mut self) -> Option<SourceFrame> {
        self.finished = true;
        log::debug!(
            "Source exhausted after {} frames: {}",
            self.frames_decoded,
            self.path.display()
        );
        None
    }

    /// Convert the current `decoded_frame` to packed RGB at native size.
    fn convert_current_frame(&mut self) -> Result<SourceFrame, FrameStreamError> {
        let format = self.decoded_frame.format();
        let width = self.decoded_frame.width();
        let height = self.decoded_frame.height();

        let stale = self.scaler.as_ref().is_none_or(|scaler| {
            let input = scaler.input();
            input.format != format || input.width != width || input.height != height
        });
        if stale {
            if self.scaler.is_some() {
                log::debug!("Source frame format changed to {format:?} {width}x{height}");
            }
            self.scaler = Some(ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?);
            self.rgb_frame = VideoFrame::empty();
        }

        if let Some(scaler) = self.scaler.as_mut() {
            scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;
        }

        let data = crate::utilities::frame_to_buffer(&self.rgb_frame, width, height, BYTES_PER_PIXEL);
        Ok(SourceFrame::new(data, width, height, ChannelOrder::Rgb))
    }
}

impl FrameSource for VideoSource {
    fn frame_count(&self) -> u64 {
        self.video_metadata.frame_count
    }

    fn source_width(&self) -> u32 {
        self.video_metadata.width
    }

    fn source_height(&self) -> u32 {
        self.video_metadata.height
    }

    fn frame_rate(&self) -> f64 {
        self.video_metadata.frames_per_second
    }

    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FrameStreamError> {
        if self.finished {
            return Ok(None);
        }

        let mut read_errors = 0;
        loop {
            // Drain frames the decoder has already produced.
            match classify_receive(self.decoder.receive_frame(&mut self.decoded_frame)) {
                ReceiveOutcome::Frame => {
                    let frame = self.convert_current_frame().inspect_err(|_| {
                        self.finished = true;
                    })?;
                    self.frames_decoded += 1;
                    log::trace!("Decoded source frame {}", self.frames_decoded);
                    return Ok(Some(frame));
                }
                ReceiveOutcome::Failed(error) => {
                    self.finished = true;
                    return Err(FrameStreamError::VideoDecodeError(format!(
                        "decoder failed after frame {}: {error}",
                        self.frames_decoded
                    )));
                }
                ReceiveOutcome::Drained => return Ok(self.exhausted()),
                ReceiveOutcome::NeedsInput if self.eof_sent => return Ok(self.exhausted()),
                ReceiveOutcome::NeedsInput => {}
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    read_errors = 0;
                    if packet.stream() == self.video_stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            self.finished = true;
                            return Err(FrameStreamError::VideoDecodeError(format!(
                                "decoder rejected packet after frame {}: {error}",
                                self.frames_decoded
                            )));
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    read_errors += 1;
                    if read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        self.finished = true;
                        return Err(FrameStreamError::VideoDecodeError(format!(
                            "{read_errors} consecutive unreadable packets, last: {error}"
                        )));
                    }
                    log::warn!("Skipping unreadable packet: {error}");
                }
            }
        }
    }
}

/// What a `receive_frame` call means for the decode loop.
#[derive(Debug)]
enum ReceiveOutcome {
    Frame,
    NeedsInput,
    Drained,
    Failed(FfmpegError),
}

fn classify_receive(result: Result<(), FfmpegError>) -> ReceiveOutcome {
    match result {
        Ok(()) => ReceiveOutcome::Frame,
        Err(FfmpegError::Other { errno }) if errno == EAGAIN => ReceiveOutcome::NeedsInput,
        Err(FfmpegError::Eof) => ReceiveOutcome::Drained,
        Err(error) => ReceiveOutcome::Failed(error),
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        log::debug!(
            "Releasing video source after {} decoded frames: {}",
            self.frames_decoded,
            self.path.display()
        );
    }
}
