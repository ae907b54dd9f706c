//! Conversion configuration.
//!
//! [`ConvertOptions`] is a builder that threads render settings, progress
//! callbacks, cancellation tokens, and output behaviour through
//! [`convert`](crate::convert) without polluting every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framestream::{CancellationToken, ConvertOptions, ProgressCallback, ProgressInfo, ResizeFilter};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {} done", info.operation, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = ConvertOptions::new()
//!     .with_render_width(150)
//!     .with_resize_filter(ResizeFilter::Nearest)
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_batch_size(10);
//! ```

use std::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    str::FromStr,
    sync::Arc,
};

use image::imageops::FilterType;

use crate::{
    geometry::DEFAULT_RENDER_WIDTH,
    progress::{CancellationToken, NoOpProgress, ProgressCallback},
};

/// Resampling filter used when resizing frames to render resolution.
///
/// Every filter is deterministic: converting the same input twice yields
/// byte-identical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    /// Nearest neighbour. Exact source pixels, blocky output.
    Nearest,
    /// Bilinear. This is the default.
    #[default]
    Triangle,
    /// Catmull-Rom cubic.
    CatmullRom,
    /// Gaussian.
    Gaussian,
    /// Lanczos with a window of 3.
    Lanczos3,
}

impl ResizeFilter {
    /// Map to the corresponding `image` crate filter.
    pub(crate) fn to_filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl Display for ResizeFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ResizeFilter::Nearest => "nearest",
            ResizeFilter::Triangle => "triangle",
            ResizeFilter::CatmullRom => "catmull-rom",
            ResizeFilter::Gaussian => "gaussian",
            ResizeFilter::Lanczos3 => "lanczos3",
        };
        f.write_str(name)
    }
}

impl FromStr for ResizeFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "nearest" | "point" => Ok(ResizeFilter::Nearest),
            "triangle" | "bilinear" | "linear" => Ok(ResizeFilter::Triangle),
            "catmull-rom" | "catmullrom" | "cubic" | "bicubic" => Ok(ResizeFilter::CatmullRom),
            "gaussian" => Ok(ResizeFilter::Gaussian),
            "lanczos3" | "lanczos" => Ok(ResizeFilter::Lanczos3),
            other => Err(format!("unsupported resize filter: {other}")),
        }
    }
}

/// Configuration for a conversion.
///
/// All fields have sensible defaults: a default-constructed value renders at
/// 150 pixels wide with bilinear resampling, reports no progress, cannot be
/// cancelled, and writes the destination in place.
#[derive(Clone)]
pub struct ConvertOptions {
    /// Width of every stored frame.
    pub(crate) render_width: u32,
    /// Resampling filter.
    pub(crate) resize_filter: ResizeFilter,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
    /// Write to a sibling `.part` file and rename on success.
    pub(crate) atomic_output: bool,
}

impl Debug for ConvertOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConvertOptions")
            .field("render_width", &self.render_width)
            .field("resize_filter", &self.resize_filter)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("atomic_output", &self.atomic_output)
            .finish_non_exhaustive()
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertOptions {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self {
            render_width: DEFAULT_RENDER_WIDTH,
            resize_filter: ResizeFilter::default(),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            atomic_output: false,
        }
    }

    /// Set the render width. The height follows from the source aspect
    /// ratio.
    #[must_use]
    pub fn with_render_width(mut self, width: u32) -> Self {
        self.render_width = width;
        self
    }

    /// Set the resampling filter.
    #[must_use]
    pub fn with_resize_filter(mut self, filter: ResizeFilter) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Attach a progress callback.
    ///
    /// The callback is invoked every
    /// [`batch_size`](ConvertOptions::with_batch_size) frames and once more
    /// when the conversion finishes.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the conversion stops before the next
    /// frame and returns [`FrameStreamError::Cancelled`](crate::FrameStreamError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Write to `<output>.part` and rename over `<output>` only once every
    /// frame has been written. A failed or cancelled conversion removes the
    /// partial file instead of leaving it behind.
    #[must_use]
    pub fn with_atomic_output(mut self, atomic: bool) -> Self {
        self.atomic_output = atomic;
        self
    }

    /// The configured render width.
    pub fn render_width(&self) -> u32 {
        self.render_width
    }

    /// The configured resampling filter.
    pub fn resize_filter(&self) -> ResizeFilter {
        self.resize_filter
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
