//! Error types for the `framestream` crate.
//!
//! This module defines [`FrameStreamError`], the unified error type returned
//! by all fallible operations in the crate. Each variant names the pipeline
//! stage that failed and carries enough context (paths, dimensions, toolchain
//! diagnostics) to explain why.
//!
//! A short write, where the source ends before its declared frame count, is
//! not an error. It is reported through
//! [`ConversionReport`](crate::ConversionReport).

use std::{io::Error as IoError, path::PathBuf, process::ExitStatus};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framestream` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameStreamError {
    /// The source video could not be opened or contains no decodable video
    /// stream.
    #[error("Source unavailable at {path}: {reason}")]
    SourceUnavailable {
        /// Path that was passed to [`VideoSource::open`](crate::VideoSource::open).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The source reported a zero width or height, so no render geometry can
    /// be derived. Raised before anything is written.
    #[error("Cannot determine render geometry from source dimensions {width}x{height}")]
    GeometryUndetermined {
        /// Reported source width.
        width: u32,
        /// Reported source height.
        height: u32,
    },

    /// The configured render width was zero.
    #[error("Render width must be greater than zero")]
    InvalidRenderWidth,

    /// The destination file could not be created or opened for writing.
    #[error("Destination unavailable at {path}: {reason}")]
    DestinationUnavailable {
        /// Destination path.
        path: PathBuf,
        /// Underlying reason the create failed.
        reason: String,
    },

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// A frame buffer does not match the byte length implied by its geometry.
    #[error("Frame buffer holds {actual} bytes, expected {expected}")]
    FrameSizeMismatch {
        /// Bytes required by the render geometry.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// A [`Conversion`](crate::Conversion) step was called out of order.
    #[error("Invalid conversion state: {0}")]
    InvalidState(String),

    /// A frame stream file has a missing or malformed header.
    #[error("Invalid frame stream header: {0}")]
    InvalidHeader(String),

    /// The media file does not contain an audio stream.
    #[error("No audio stream found in file")]
    NoAudioStream,

    /// The external encoding toolchain could not be found or executed.
    #[error("Toolchain `{program}` unavailable: {reason}")]
    ToolchainUnavailable {
        /// Program that was probed.
        program: PathBuf,
        /// Why the probe failed.
        reason: String,
    },

    /// The external encoding toolchain ran but exited unsuccessfully.
    #[error("Toolchain `{program}` failed ({status}): {stderr}")]
    ToolchainFailed {
        /// Program that was run.
        program: PathBuf,
        /// Exit status reported by the process.
        status: ExitStatus,
        /// Diagnostic text captured from the process's stderr.
        stderr: String,
    },

    /// The conversion was cancelled via a
    /// [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while resampling a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for FrameStreamError {
    fn from(error: FfmpegError) -> Self {
        FrameStreamError::FfmpegError(error.to_string())
    }
}
