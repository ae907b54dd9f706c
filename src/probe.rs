//! Lightweight media file probing.
//!
//! [`MediaProbe`] extracts metadata from a media file without keeping the
//! demuxer open. The same extraction backs
//! [`VideoSource::open`](crate::VideoSource::open), so a probe reports exactly
//! the frame count and rate a conversion would write into its header.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Stream, codec::context::Context as CodecContext, format::context::Input, media::Type,
};

use crate::{
    error::FrameStreamError,
    metadata::{AudioMetadata, MediaMetadata, VideoMetadata},
    utilities,
};

/// Lightweight media file probe.
///
/// # Example
///
/// ```no_run
/// use framestream::MediaProbe;
///
/// let metadata = MediaProbe::probe("input.mp4")?;
/// if let Some(video) = &metadata.video {
///     println!(
///         "{}x{} @ {:.2} fps, {} frames",
///         video.width, video.height, video.frames_per_second, video.frame_count
///     );
/// }
/// # Ok::<(), framestream::FrameStreamError>(())
/// ```
pub struct MediaProbe;

impl MediaProbe {
    /// Probe a media file and return its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`FrameStreamError::SourceUnavailable`] if the file cannot be
    /// opened or recognised as a media file.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<MediaMetadata, FrameStreamError> {
        let path = path.as_ref();
        let input_context = open_input(path)?;
        read_metadata(&input_context, path)
    }

    /// Probe multiple media files.
    ///
    /// Files that cannot be probed produce an `Err` entry rather than
    /// aborting the batch.
    pub fn probe_many<P: AsRef<Path>>(paths: &[P]) -> Vec<Result<MediaMetadata, FrameStreamError>> {
        paths.iter().map(Self::probe).collect()
    }
}

/// Initialise FFmpeg and open `path` as a demuxer input.
pub(crate) fn open_input(path: &Path) -> Result<Input, FrameStreamError> {
    ffmpeg_next::init().map_err(|error| {
        source_unavailable(path, format!("FFmpeg initialisation failed: {error}"))
    })?;

    ffmpeg_next::format::input(&path).map_err(|error| source_unavailable(path, error.to_string()))
}

pub(crate) fn source_unavailable(path: &Path, reason: impl Into<String>) -> FrameStreamError {
    FrameStreamError::SourceUnavailable {
        path: PathBuf::from(path),
        reason: reason.into(),
    }
}

/// Read container, best-video, and best-audio metadata from an open input.
pub(crate) fn read_metadata(
    input_context: &Input,
    path: &Path,
) -> Result<MediaMetadata, FrameStreamError> {
    let duration_microseconds = input_context.duration();
    let duration = if duration_microseconds > 0 {
        Duration::from_micros(duration_microseconds as u64)
    } else {
        Duration::ZERO
    };

    let format = input_context.format().name().to_string();

    let video = match input_context.streams().best(Type::Video) {
        Some(stream) => Some(read_video_metadata(&stream, duration, path)?),
        None => None,
    };

    // An audio track without a usable decoder leaves `audio` empty.
    let audio = input_context
        .streams()
        .best(Type::Audio)
        .and_then(|stream| usable_audio(read_audio_metadata(&stream, path)));

    Ok(MediaMetadata {
        video,
        audio,
        duration,
        format,
    })
}

/// Frame rate of a video stream: average rate, then real base rate, then 0.
pub(crate) fn stream_frame_rate(stream: &Stream<'_>) -> f64 {
    utilities::rational_to_f64(stream.avg_frame_rate())
        .filter(|rate| *rate > 0.0)
        .or_else(|| utilities::rational_to_f64(stream.rate()).filter(|rate| *rate > 0.0))
        .unwrap_or(0.0)
}

pub(crate) fn read_video_metadata(
    stream: &Stream<'_>,
    container_duration: Duration,
    path: &Path,
) -> Result<VideoMetadata, FrameStreamError> {
    let index = stream.index();
    let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(|error| {
        source_unavailable(
            path,
            format!("Failed to read video codec parameters for stream {index}: {error}"),
        )
    })?;
    let video_decoder = decoder_context.decoder().video().map_err(|error| {
        source_unavailable(
            path,
            format!("Failed to create video decoder for stream {index}: {error}"),
        )
    })?;

    let frames_per_second = stream_frame_rate(stream);

    // Prefer the stream's own duration over the container's.
    let stream_duration = utilities::pts_to_seconds(stream.duration(), stream.time_base());
    let duration_seconds = if stream.duration() > 0 && stream_duration > 0.0 {
        stream_duration
    } else {
        container_duration.as_secs_f64()
    };

    let recorded_frames = stream.frames();
    let (frame_count, frame_count_is_estimate) = if recorded_frames > 0 {
        (recorded_frames as u64, false)
    } else {
        (
            utilities::estimate_frame_count(duration_seconds, frames_per_second),
            true,
        )
    };

    let codec = video_decoder
        .codec()
        .map(|codec| codec.name().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(VideoMetadata {
        width: video_decoder.width(),
        height: video_decoder.height(),
        frames_per_second,
        frame_count,
        frame_count_is_estimate,
        codec,
    })
}

fn usable_audio(result: Result<AudioMetadata, FrameStreamError>) -> Option<AudioMetadata> {
    result
        .inspect_err(|error| log::warn!("Ignoring unreadable audio stream: {error}"))
        .ok()
}

fn read_audio_metadata(stream: &Stream<'_>, path: &Path) -> Result<AudioMetadata, FrameStreamError> {
    let index = stream.index();
    let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(|error| {
        source_unavailable(
            path,
            format!("Failed to read audio codec parameters for stream {index}: {error}"),
        )
    })?;
    let audio_decoder = decoder_context.decoder().audio().map_err(|error| {
        source_unavailable(
            path,
            format!("Failed to create audio decoder for stream {index}: {error}"),
        )
    })?;

    let codec = audio_decoder
        .codec()
        .map(|codec| codec.name().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(AudioMetadata {
        sample_rate: audio_decoder.rate(),
        channels: audio_decoder.channels(),
        codec,
        bit_rate: audio_decoder.bit_rate() as u64,
    })
}
