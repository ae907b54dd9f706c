//! Media metadata types.
//!
//! This module defines the metadata structures returned by
//! [`VideoSource::metadata`](crate::VideoSource::metadata) and
//! [`MediaProbe::probe`](crate::MediaProbe::probe). Metadata is read from the
//! container when the file is opened, before any frame is decoded.

use std::time::Duration;

/// Complete metadata for a media file.
///
/// Contains optional video and audio stream metadata, plus container-level
/// information such as total duration and format name.
///
/// # Example
///
/// ```no_run
/// use framestream::MediaProbe;
///
/// let metadata = MediaProbe::probe("input.mp4").unwrap();
/// println!("Duration: {:?}", metadata.duration);
/// println!("Format: {}", metadata.format);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct MediaMetadata {
    /// Best video stream metadata, if a video stream is present.
    pub video: Option<VideoMetadata>,
    /// Best audio stream metadata, if an audio stream is present.
    pub audio: Option<AudioMetadata>,
    /// Total duration of the media file.
    pub duration: Duration,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`, `"matroska,webm"`).
    pub format: String,
}

impl MediaMetadata {
    /// Returns `true` if the file carries at least one audio stream.
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}

/// Metadata for a video stream.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Number of frames the container claims the stream holds.
    ///
    /// This value is what ends up in the frame stream header. It can exceed
    /// the number of frames that actually decode.
    pub frame_count: u64,
    /// `true` when the container did not record a frame count and
    /// [`frame_count`](VideoMetadata::frame_count) was derived from duration
    /// and frame rate.
    pub frame_count_is_estimate: bool,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
}

/// Metadata for an audio stream.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct AudioMetadata {
    /// Sample rate in hertz (e.g. `44100`, `48000`).
    pub sample_rate: u32,
    /// Number of audio channels (e.g. `2` for stereo).
    pub channels: u16,
    /// Codec name (e.g. `"aac"`, `"mp3"`, `"flac"`).
    pub codec: String,
    /// Bit rate in bits per second.
    pub bit_rate: u64,
}
