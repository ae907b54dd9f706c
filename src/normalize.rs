//! Frame normalization.
//!
//! [`FrameNormalizer`] turns a [`SourceFrame`] of any size and channel order
//! into a [`FrameBuffer`] at the stream's render resolution, in RGB. It keeps
//! no state between frames.

use image::{RgbImage, imageops};

use crate::{
    config::ResizeFilter,
    error::FrameStreamError,
    frame::{ChannelOrder, FrameBuffer, SourceFrame},
    geometry::{BYTES_PER_PIXEL, TargetGeometry},
};

/// Resizes and reorders frames to the stored stream format.
///
/// # Example
///
/// ```
/// use framestream::{ChannelOrder, FrameNormalizer, ResizeFilter, SourceFrame, TargetGeometry};
///
/// let normalizer = FrameNormalizer::new(ResizeFilter::Nearest);
/// let geometry = TargetGeometry::resolve(4, 2, 1)?;
/// // A 2x1 BGR frame: one pure blue pixel, one pure red pixel.
/// let frame = SourceFrame::new(vec![255, 0, 0, 0, 0, 255], 2, 1, ChannelOrder::Bgr);
///
/// let normalized = normalizer.normalize(frame, geometry)?;
/// assert_eq!((normalized.width(), normalized.height()), (4, 2));
/// assert_eq!(normalized.pixel(0, 0), [0, 0, 255]);
/// assert_eq!(normalized.pixel(3, 1), [255, 0, 0]);
/// # Ok::<(), framestream::FrameStreamError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameNormalizer {
    filter: ResizeFilter,
}

impl FrameNormalizer {
    /// Create a normalizer using the given resampling filter.
    pub fn new(filter: ResizeFilter) -> Self {
        Self { filter }
    }

    /// The resampling filter in use.
    pub fn filter(&self) -> ResizeFilter {
        self.filter
    }

    /// Normalize one frame.
    ///
    /// Resizes to exactly `geometry`'s dimensions, swaps BGR to RGB when
    /// needed, and returns tightly-packed RGB bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameStreamError::VideoDecodeError`] if the frame is empty
    /// or its byte length disagrees with its dimensions.
    pub fn normalize(
        &self,
        frame: SourceFrame,
        geometry: TargetGeometry,
    ) -> Result<FrameBuffer, FrameStreamError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(FrameStreamError::VideoDecodeError(format!(
                "source frame has empty dimensions {}x{}",
                frame.width, frame.height
            )));
        }
        if frame.data.len() != frame.expected_len() {
            return Err(FrameStreamError::VideoDecodeError(format!(
                "source frame {}x{} holds {} bytes, expected {}",
                frame.width,
                frame.height,
                frame.data.len(),
                frame.expected_len()
            )));
        }

        let SourceFrame {
            data,
            width,
            height,
            channel_order,
        } = frame;
        let TargetGeometry {
            render_width,
            render_height,
        } = geometry;

        let source = RgbImage::from_raw(width, height, data).ok_or_else(|| {
            FrameStreamError::VideoDecodeError(
                "Failed to construct image from source frame data".to_string(),
            )
        })?;

        let mut pixels = if (width, height) == (render_width, render_height) {
            source.into_raw()
        } else {
            imageops::resize(
                &source,
                render_width,
                render_height,
                self.filter.to_filter_type(),
            )
            .into_raw()
        };

        if channel_order == ChannelOrder::Bgr {
            for pixel in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.swap(0, 2);
            }
        }

        let actual = pixels.len();
        FrameBuffer::from_raw(pixels, render_width, render_height).ok_or(
            FrameStreamError::FrameSizeMismatch {
                expected: geometry.frame_len(),
                actual,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32, order: ChannelOrder) -> SourceFrame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let value = if (x + y) % 2 == 0 { 255 } else { 0 };
                data.extend_from_slice(&[value, 0, 255 - value]);
            }
        }
        SourceFrame::new(data, width, height, order)
    }

    #[test]
    fn output_length_matches_geometry() {
        let normalizer = FrameNormalizer::default();
        for (width, height) in [(640, 480), (7, 3), (1, 1), (1920, 1080)] {
            let geometry = TargetGeometry::resolve(150, width, height).unwrap();
            let frame = checkerboard(width, height, ChannelOrder::Rgb);
            let normalized = normalizer.normalize(frame, geometry).unwrap();
            assert_eq!(normalized.as_bytes().len(), geometry.frame_len());
        }
    }

    #[test]
    fn same_size_rgb_is_passed_through() {
        let frame = checkerboard(3, 2, ChannelOrder::Rgb);
        let expected = frame.data.clone();
        let geometry = TargetGeometry {
            render_width: 3,
            render_height: 2,
        };
        let normalized = FrameNormalizer::default().normalize(frame, geometry).unwrap();
        assert_eq!(normalized.as_bytes(), expected.as_slice());
    }

    #[test]
    fn bgr_is_swapped_to_rgb() {
        let frame = SourceFrame::new(vec![1, 2, 3, 4, 5, 6], 2, 1, ChannelOrder::Bgr);
        let geometry = TargetGeometry {
            render_width: 2,
            render_height: 1,
        };
        let normalized = FrameNormalizer::default().normalize(frame, geometry).unwrap();
        assert_eq!(normalized.as_bytes(), &[3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn short_frame_is_rejected() {
        let frame = SourceFrame::new(vec![0; 5], 2, 1, ChannelOrder::Rgb);
        let geometry = TargetGeometry {
            render_width: 2,
            render_height: 1,
        };
        let result = FrameNormalizer::default().normalize(frame, geometry);
        assert!(matches!(result, Err(FrameStreamError::VideoDecodeError(_))));
    }

    #[test]
    fn nearest_downscale_is_deterministic() {
        let normalizer = FrameNormalizer::new(ResizeFilter::Nearest);
        let geometry = TargetGeometry::resolve(150, 640, 480).unwrap();
        let first = normalizer
            .normalize(checkerboard(640, 480, ChannelOrder::Bgr), geometry)
            .unwrap();
        let second = normalizer
            .normalize(checkerboard(640, 480, ChannelOrder::Bgr), geometry)
            .unwrap();
        assert_eq!(first, second);
    }
}
