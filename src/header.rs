//! The fixed 16-byte frame stream header.
//!
//! Layout (little-endian):
//!
//! | Offset | Size | Field           | Type |
//! |--------|------|-----------------|------|
//! | 0      | 4    | `render_width`  | u32  |
//! | 4      | 4    | `render_height` | u32  |
//! | 8      | 4    | `frame_count`   | u32  |
//! | 12     | 4    | `frame_rate`    | f32  |
//!
//! Frame records follow immediately, each `render_width * render_height * 3`
//! bytes of packed RGB.

use crate::{error::FrameStreamError, geometry::TargetGeometry};

/// Size of the serialized header in bytes.
pub const HEADER_LEN: usize = 16;

/// The header written once at offset 0 of every frame stream.
///
/// `frame_count` is the count the source container *declared*, not the
/// number of frames that end up in the file. Readers must compare it
/// against the file size to detect a short stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileHeader {
    /// Width of every frame record.
    pub render_width: u32,
    /// Height of every frame record.
    pub render_height: u32,
    /// Declared frame count.
    pub frame_count: u32,
    /// Source frame rate. Informational; players use it to pace playback.
    pub frame_rate: f32,
}

impl FileHeader {
    /// Build a header from a resolved geometry and the source's declared
    /// frame count and rate.
    ///
    /// Frame counts above `u32::MAX` saturate.
    pub fn new(geometry: TargetGeometry, declared_frames: u64, frame_rate: f64) -> Self {
        Self {
            render_width: geometry.render_width,
            render_height: geometry.render_height,
            frame_count: u32::try_from(declared_frames).unwrap_or(u32::MAX),
            frame_rate: frame_rate as f32,
        }
    }

    /// The render geometry encoded in this header.
    pub fn geometry(&self) -> TargetGeometry {
        TargetGeometry {
            render_width: self.render_width,
            render_height: self.render_height,
        }
    }

    /// Byte length of one frame record. Saturates at `usize::MAX`; use
    /// [`checked_frame_len`](Self::checked_frame_len) for untrusted headers.
    pub fn frame_len(&self) -> usize {
        self.geometry().frame_len()
    }

    /// Byte length of one frame record, checked against overflow.
    ///
    /// # Errors
    ///
    /// Returns [`FrameStreamError::InvalidHeader`] on overflow.
    pub fn checked_frame_len(&self) -> Result<usize, FrameStreamError> {
        self.geometry().checked_frame_len().ok_or_else(|| {
            FrameStreamError::InvalidHeader(format!(
                "frame geometry {}x{} is too large",
                self.render_width, self.render_height
            ))
        })
    }

    /// Total file size a complete stream of `frames` records would occupy.
    /// Saturates at `u64::MAX`.
    pub fn stream_len(&self, frames: u64) -> u64 {
        (self.frame_len() as u64)
            .saturating_mul(frames)
            .saturating_add(HEADER_LEN as u64)
    }

    /// Serialize to the on-disk byte layout.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.render_width.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.render_height.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.frame_count.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.frame_rate.to_le_bytes());
        bytes
    }

    /// Parse a header from the first [`HEADER_LEN`] bytes of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameStreamError::InvalidHeader`] if fewer than
    /// [`HEADER_LEN`] bytes are available.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameStreamError> {
        let Some(bytes) = bytes.get(..HEADER_LEN) else {
            return Err(FrameStreamError::InvalidHeader(format!(
                "expected {HEADER_LEN} bytes, found {}",
                bytes.len()
            )));
        };

        let word = |offset: usize| -> [u8; 4] {
            [
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]
        };

        Ok(Self {
            render_width: u32::from_le_bytes(word(0)),
            render_height: u32::from_le_bytes(word(4)),
            frame_count: u32::from_le_bytes(word(8)),
            frame_rate: f32::from_le_bytes(word(12)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_header() -> FileHeader {
        let geometry = TargetGeometry::resolve(150, 640, 480).unwrap();
        FileHeader::new(geometry, 60, 30.0)
    }

    #[test]
    fn byte_layout_is_little_endian() {
        let bytes = reference_header().to_bytes();
        assert_eq!(&bytes[0..4], &[150, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[112, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[60, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &30.0f32.to_le_bytes());
    }

    #[test]
    fn parses_what_it_writes() {
        let header = reference_header();
        assert_eq!(FileHeader::from_bytes(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn short_input_is_rejected() {
        let error = FileHeader::from_bytes(&[0u8; 10]).unwrap_err();
        assert!(error.to_string().contains("found 10"));
    }

    #[test]
    fn declared_count_saturates() {
        let geometry = TargetGeometry::resolve(150, 640, 480).unwrap();
        let header = FileHeader::new(geometry, u64::MAX, 25.0);
        assert_eq!(header.frame_count, u32::MAX);
    }

    #[test]
    fn stream_len_counts_header_and_records() {
        let header = reference_header();
        assert_eq!(header.stream_len(0), 16);
        assert_eq!(header.stream_len(60), 16 + 150 * 112 * 3 * 60);
    }

    #[test]
    fn corrupt_geometry_does_not_overflow() {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[..8].fill(0xFF);
        let header = FileHeader::from_bytes(&bytes).unwrap();

        assert!(matches!(
            header.checked_frame_len(),
            Err(FrameStreamError::InvalidHeader(_))
        ));
        assert_eq!(header.stream_len(u64::MAX), u64::MAX);
    }
}
