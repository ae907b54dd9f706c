//! Internal utility functions.
//!
//! Helpers for pixel-data copying and rational/timestamp conversion that are
//! shared between the source reader and the metadata probe.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × bpp).
/// The returned buffer has that padding stripped. `bytes_per_pixel` is 3
/// for RGB24.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Value of a rational, or `None` when the denominator is zero.
pub(crate) fn rational_to_f64(rational: Rational) -> Option<f64> {
    if rational.denominator() == 0 {
        None
    } else {
        Some(rational.numerator() as f64 / rational.denominator() as f64)
    }
}

/// Rescale a PTS-style value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    rational_to_f64(time_base).map_or(0.0, |unit| pts as f64 * unit)
}

/// Estimate a frame count from a duration and a frame rate, rounding to the
/// nearest frame.
pub(crate) fn estimate_frame_count(duration_seconds: f64, frames_per_second: f64) -> u64 {
    if duration_seconds <= 0.0 || frames_per_second <= 0.0 {
        return 0;
    }
    (duration_seconds * frames_per_second).round() as u64
}
