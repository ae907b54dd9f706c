//! Audio extraction.
//!
//! This module provides [`AudioExtractor`] for pulling the audio track out of
//! a video into a standalone file, and [`AudioFormat`] for choosing the
//! output encoding. The input is inspected with the linked FFmpeg libraries;
//! the encoding itself runs through the external [`Toolchain`].

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{
    error::FrameStreamError,
    probe::MediaProbe,
    toolchain::{Toolchain, TranscodeOptions},
};

/// Bit rate used for lossy formats unless overridden.
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";

/// Audio output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    /// MP3 (MPEG Audio Layer III). Lossy, widely supported. Requires libmp3lame.
    #[default]
    Mp3,
    /// AAC (Advanced Audio Coding). Lossy, high quality at low bitrates.
    Aac,
    /// FLAC (Free Lossless Audio Codec). Lossless, good compression.
    Flac,
    /// WAV (PCM signed 16-bit little-endian). Lossless, universally supported.
    Wav,
}

impl Display for AudioFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AudioFormat::Mp3 => write!(f, "MP3"),
            AudioFormat::Aac => write!(f, "AAC"),
            AudioFormat::Flac => write!(f, "FLAC"),
            AudioFormat::Wav => write!(f, "WAV"),
        }
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "aac" | "m4a" => Ok(AudioFormat::Aac),
            "flac" => Ok(AudioFormat::Flac),
            "wav" | "pcm" => Ok(AudioFormat::Wav),
            other => Err(format!("unsupported audio format: {other}")),
        }
    }
}

impl AudioFormat {
    /// The `ffmpeg` encoder name for this format.
    pub fn encoder(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "libmp3lame",
            AudioFormat::Aac => "aac",
            AudioFormat::Flac => "flac",
            AudioFormat::Wav => "pcm_s16le",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Aac => "m4a",
            AudioFormat::Flac => "flac",
            AudioFormat::Wav => "wav",
        }
    }

    /// Returns `true` for formats where a bit rate is meaningless.
    pub fn is_lossless(self) -> bool {
        matches!(self, AudioFormat::Flac | AudioFormat::Wav)
    }
}

/// Extracts the audio track of a video into its own file.
///
/// # Example
///
/// ```no_run
/// use framestream::{AudioExtractor, AudioFormat, Toolchain};
///
/// let extractor = AudioExtractor::new(Toolchain::default()).with_format(AudioFormat::Mp3);
/// extractor.extract("input.mp4", "audio.mp3")?;
/// # Ok::<(), framestream::FrameStreamError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AudioExtractor {
    toolchain: Toolchain,
    format: AudioFormat,
    bitrate: String,
}

impl AudioExtractor {
    /// Create an extractor producing 192 kbit/s MP3.
    pub fn new(toolchain: Toolchain) -> Self {
        Self {
            toolchain,
            format: AudioFormat::default(),
            bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the bit rate for lossy formats, e.g. `"128k"`. Ignored for
    /// lossless formats.
    #[must_use]
    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = bitrate.into();
        self
    }

    /// The configured output format.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Default output path for `video`: the same stem with this format's
    /// extension.
    pub fn default_output_for<P: AsRef<Path>>(&self, video: P) -> PathBuf {
        video.as_ref().with_extension(self.format.extension())
    }

    /// The `ffmpeg` parameters this extractor will use.
    pub fn transcode_options(&self) -> TranscodeOptions {
        let options = TranscodeOptions::new()
            .no_video(true)
            .audio_codec(self.format.encoder());
        if self.format.is_lossless() {
            options
        } else {
            options.audio_bitrate(self.bitrate.as_str())
        }
    }

    /// Extract the audio of `video` into `output`.
    ///
    /// # Errors
    ///
    /// - [`FrameStreamError::SourceUnavailable`] if `video` cannot be opened.
    /// - [`FrameStreamError::NoAudioStream`] if it has no audio track.
    /// - [`FrameStreamError::ToolchainUnavailable`] or
    ///   [`FrameStreamError::ToolchainFailed`] from the encoding step.
    pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        video: P,
        output: Q,
    ) -> Result<(), FrameStreamError> {
        let video = video.as_ref();
        let output = output.as_ref();

        let metadata = MediaProbe::probe(video)?;
        let Some(audio) = &metadata.audio else {
            return Err(FrameStreamError::NoAudioStream);
        };
        log::debug!(
            "Extracting {} audio ({} Hz, {} channels) from {}",
            audio.codec,
            audio.sample_rate,
            audio.channels,
            video.display()
        );

        self.toolchain.probe()?;
        self.toolchain
            .transcode(video, output, &self.transcode_options())?;
        log::info!("Extracted {} audio to {}", self.format, output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossy_formats_carry_bitrate() {
        let options = AudioExtractor::new(Toolchain::default()).transcode_options();
        assert_eq!(options, TranscodeOptions::mp3());
    }

    #[test]
    fn lossless_formats_ignore_bitrate() {
        let options = AudioExtractor::new(Toolchain::default())
            .with_format(AudioFormat::Flac)
            .with_bitrate("320k")
            .transcode_options();
        assert_eq!(options.audio_bitrate, None);
        assert_eq!(options.audio_codec.as_deref(), Some("flac"));
    }

    #[test]
    fn format_names_parse() {
        assert_eq!("MP3".parse::<AudioFormat>(), Ok(AudioFormat::Mp3));
        assert_eq!("m4a".parse::<AudioFormat>(), Ok(AudioFormat::Aac));
        assert!("ogg".parse::<AudioFormat>().is_err());
    }

    #[test]
    fn default_output_swaps_extension() {
        let extractor = AudioExtractor::new(Toolchain::default()).with_format(AudioFormat::Wav);
        assert_eq!(
            extractor.default_output_for("clips/frame.mp4"),
            PathBuf::from("clips/frame.wav")
        );
    }
}
