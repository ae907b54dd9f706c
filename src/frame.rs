//! Frame containers passed between pipeline stages.
//!
//! [`SourceFrame`] is what a [`FrameSource`](crate::FrameSource) yields: packed
//! 8-bit pixels at the source's native resolution, in the source's channel
//! order. [`FrameBuffer`] is what the normalizer produces and the writer
//! consumes: packed RGB at render resolution.

use image::RgbImage;

use crate::{error::FrameStreamError, geometry::BYTES_PER_PIXEL};

/// Order of the three colour channels within a packed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Red, green, blue. The order stored in frame streams.
    #[default]
    Rgb,
    /// Blue, green, red, as produced by many capture and decode libraries.
    Bgr,
}

/// One decoded frame at source resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFrame {
    /// Packed pixel bytes, row-major, 3 bytes per pixel, no row padding.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channel order of `data`.
    pub channel_order: ChannelOrder,
}

impl SourceFrame {
    /// Wrap packed pixel data.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channel_order: ChannelOrder) -> Self {
        Self {
            data,
            width,
            height,
            channel_order,
        }
    }

    /// Byte length implied by the frame's dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }
}

/// One normalized frame at render resolution: packed RGB8, row-major.
///
/// Its byte length is always `width * height * 3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    /// Wrap packed RGB bytes.
    ///
    /// Returns `None` if `data.len() != width * height * 3`.
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if data.len() != width as usize * height as usize * BYTES_PER_PIXEL {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw frame record bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// RGB value of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }

    /// Consume the buffer, returning the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Convert to an [`image::RgbImage`] for saving or further processing.
    pub fn into_image(self) -> Result<RgbImage, FrameStreamError> {
        let expected = self.width as usize * self.height as usize * BYTES_PER_PIXEL;
        let actual = self.data.len();
        RgbImage::from_raw(self.width, self.height, self.data)
            .ok_or(FrameStreamError::FrameSizeMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_checks_length() {
        assert!(FrameBuffer::from_raw(vec![0; 12], 2, 2).is_some());
        assert!(FrameBuffer::from_raw(vec![0; 11], 2, 2).is_none());
    }

    #[test]
    fn pixel_reads_row_major() {
        let data = vec![
            1, 2, 3, 4, 5, 6, //
            7, 8, 9, 10, 11, 12,
        ];
        let frame = FrameBuffer::from_raw(data, 2, 2).unwrap();
        assert_eq!(frame.pixel(1, 0), [4, 5, 6]);
        assert_eq!(frame.pixel(0, 1), [7, 8, 9]);
    }

    #[test]
    fn into_image_keeps_pixels() {
        let frame = FrameBuffer::from_raw(vec![10, 20, 30], 1, 1).unwrap();
        let image = frame.into_image().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30]);
    }
}
