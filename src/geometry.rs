//! Render geometry.
//!
//! Every frame in a frame stream shares one render resolution: a fixed width
//! and a height derived from the source aspect ratio. [`TargetGeometry`] is
//! computed once per conversion, before the output file is touched.

use crate::error::FrameStreamError;

/// Render width used when none is configured.
pub const DEFAULT_RENDER_WIDTH: u32 = 150;

/// Bytes per stored pixel (8-bit R, G, B).
pub const BYTES_PER_PIXEL: usize = 3;

/// Output resolution shared by every frame record in a stream.
///
/// # Example
///
/// ```
/// use framestream::TargetGeometry;
///
/// let geometry = TargetGeometry::resolve(150, 640, 480)?;
/// assert_eq!((geometry.render_width, geometry.render_height), (150, 112));
/// assert_eq!(geometry.frame_len(), 150 * 112 * 3);
/// # Ok::<(), framestream::FrameStreamError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetGeometry {
    /// Width of every stored frame, in pixels.
    pub render_width: u32,
    /// Height of every stored frame, in pixels.
    pub render_height: u32,
}

impl TargetGeometry {
    /// Derive the render geometry for a source of the given dimensions.
    ///
    /// `render_height = round(render_width * source_height / source_width)`,
    /// rounding half to even and never below 1.
    ///
    /// # Errors
    ///
    /// - [`FrameStreamError::InvalidRenderWidth`] if `render_width` is zero.
    /// - [`FrameStreamError::GeometryUndetermined`] if either source
    ///   dimension is zero.
    pub fn resolve(
        render_width: u32,
        source_width: u32,
        source_height: u32,
    ) -> Result<Self, FrameStreamError> {
        if render_width == 0 {
            return Err(FrameStreamError::InvalidRenderWidth);
        }
        if source_width == 0 || source_height == 0 {
            return Err(FrameStreamError::GeometryUndetermined {
                width: source_width,
                height: source_height,
            });
        }

        let ratio = source_height as f64 / source_width as f64;
        let render_height = (render_width as f64 * ratio).round_ties_even();
        let render_height = if render_height >= u32::MAX as f64 {
            u32::MAX
        } else {
            (render_height as u32).max(1)
        };

        Ok(Self {
            render_width,
            render_height,
        })
    }

    /// Number of pixels in one frame. Saturates at `usize::MAX`.
    pub fn pixel_count(&self) -> usize {
        (self.render_width as usize).saturating_mul(self.render_height as usize)
    }

    /// Byte length of one frame record. Saturates at `usize::MAX`.
    pub fn frame_len(&self) -> usize {
        self.checked_frame_len().unwrap_or(usize::MAX)
    }

    /// Byte length of one frame record, or `None` if it does not fit in
    /// memory on this platform.
    pub fn checked_frame_len(&self) -> Option<usize> {
        let len = u64::from(self.render_width)
            .checked_mul(u64::from(self.render_height))?
            .checked_mul(BYTES_PER_PIXEL as u64)?;
        usize::try_from(len).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_by_three_rounds_half_to_even() {
        let geometry = TargetGeometry::resolve(150, 640, 480).unwrap();
        assert_eq!(geometry.render_height, 112);
    }

    #[test]
    fn widescreen_sources() {
        assert_eq!(
            TargetGeometry::resolve(150, 1920, 1080).unwrap().render_height,
            84
        );
        assert_eq!(
            TargetGeometry::resolve(150, 1280, 720).unwrap().render_height,
            84
        );
    }

    #[test]
    fn rounds_to_nearest() {
        // 150 * 100 / 177 = 84.74...
        assert_eq!(
            TargetGeometry::resolve(150, 177, 100).unwrap().render_height,
            85
        );
    }

    #[test]
    fn portrait_source_is_taller_than_wide() {
        let geometry = TargetGeometry::resolve(150, 1080, 1920).unwrap();
        assert_eq!(geometry.render_height, 267);
    }

    #[test]
    fn extreme_panorama_clamps_to_one_row() {
        let geometry = TargetGeometry::resolve(150, 100_000, 1).unwrap();
        assert_eq!(geometry.render_height, 1);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            TargetGeometry::resolve(150, 0, 480),
            Err(FrameStreamError::GeometryUndetermined { width: 0, height: 480 })
        ));
        assert!(matches!(
            TargetGeometry::resolve(150, 640, 0),
            Err(FrameStreamError::GeometryUndetermined { width: 640, height: 0 })
        ));
    }

    #[test]
    fn oversized_geometry_has_no_frame_len() {
        let geometry = TargetGeometry {
            render_width: u32::MAX,
            render_height: u32::MAX,
        };
        assert_eq!(geometry.checked_frame_len(), None);
        assert_eq!(geometry.frame_len(), usize::MAX);
        assert_eq!(
            TargetGeometry::resolve(150, 640, 480).unwrap().checked_frame_len(),
            Some(150 * 112 * 3)
        );
    }

    #[test]
    fn zero_render_width_is_rejected() {
        assert!(matches!(
            TargetGeometry::resolve(0, 640, 480),
            Err(FrameStreamError::InvalidRenderWidth)
        ));
    }
}
