//! Source and output validation.
//!
//! [`validate_source`] checks a video's metadata before converting it, and
//! [`validate_stream_file`] checks a written frame stream against its own
//! header. Both return a [`ValidationReport`] rather than failing on the
//! first problem.
//!
//! # Example
//!
//! ```no_run
//! use framestream::validate_stream_file;
//!
//! let report = validate_stream_file("frames.data")?;
//! if report.is_valid() {
//!     println!("Stream is readable");
//! }
//! for warning in &report.warnings {
//!     println!("Warning: {warning}");
//! }
//! # Ok::<(), framestream::FrameStreamError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
};

use crate::{
    error::FrameStreamError,
    geometry::{DEFAULT_RENDER_WIDTH, TargetGeometry},
    metadata::VideoMetadata,
    reader::FrameStreamReader,
};

/// Summary of a validation pass.
///
/// Contains lists of informational notices, warnings, and errors.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Issues that still allow the stream to be produced or played.
    pub warnings: Vec<String>,
    /// Issues that prevent conversion or playback.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of entries (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Check a video's metadata before conversion at the default render width.
pub fn validate_source(video: &VideoMetadata) -> ValidationReport {
    validate_source_at(video, DEFAULT_RENDER_WIDTH)
}

/// Check a video's metadata before conversion at `render_width`.
pub fn validate_source_at(video: &VideoMetadata, render_width: u32) -> ValidationReport {
    let mut report = ValidationReport::default();

    report.info.push(format!(
        "Source: {} {}x{} @ {:.2} fps, {}{} frames",
        video.codec,
        video.width,
        video.height,
        video.frames_per_second,
        if video.frame_count_is_estimate { "~" } else { "" },
        video.frame_count,
    ));

    // ── Geometry ───────────────────────────────────────────────────
    match TargetGeometry::resolve(render_width, video.width, video.height) {
        Ok(geometry) => {
            report.info.push(format!(
                "Render geometry: {}x{}",
                geometry.render_width, geometry.render_height
            ));
            let exact = f64::from(render_width) * f64::from(video.height) / f64::from(video.width);
            if exact < 0.5 {
                report.warnings.push(format!(
                    "Aspect ratio {}x{} rounds to a height of 0; clamped to 1",
                    video.width, video.height
                ));
            }
        }
        Err(error) => report.errors.push(error.to_string()),
    }

    // ── Frame count and rate ───────────────────────────────────────
    if video.frame_count == 0 {
        report
            .warnings
            .push("Declared frame count is zero: the stream will hold no frames".to_string());
    } else if video.frame_count > u64::from(u32::MAX) {
        report.warnings.push(format!(
            "Declared frame count {} exceeds the header limit and will be saturated",
            video.frame_count
        ));
    }
    if video.frame_count_is_estimate {
        report.info.push(
            "Frame count is estimated from duration; the stream may end early".to_string(),
        );
    }
    if video.frames_per_second <= 0.0 {
        report
            .warnings
            .push("Frame rate is zero or negative: players cannot pace playback".to_string());
    }

    report
}

/// Check a written frame stream against its header.
///
/// # Errors
///
/// Returns an error only if the file cannot be opened or has no complete
/// header. Every other problem is reported in the [`ValidationReport`].
pub fn validate_stream_file<P: AsRef<Path>>(path: P) -> Result<ValidationReport, FrameStreamError> {
    let reader = FrameStreamReader::open(path)?;
    let header = reader.header();
    let mut report = ValidationReport::default();

    report.info.push(format!(
        "Header: {}x{}, {} declared frames @ {:.2} fps",
        header.render_width, header.render_height, header.frame_count, header.frame_rate
    ));
    report.info.push(format!(
        "{} complete frame records, {} bytes",
        reader.frames_present(),
        reader.file_len()
    ));

    if header.render_width == 0 || header.render_height == 0 {
        report.errors.push(format!(
            "Invalid render geometry {}x{}",
            header.render_width, header.render_height
        ));
    }

    if reader.trailing_bytes() > 0 {
        report.errors.push(format!(
            "{} trailing bytes do not form a complete frame record",
            reader.trailing_bytes()
        ));
    }

    let declared = reader.declared_frames();
    let present = reader.frames_present();
    if present < declared {
        report.warnings.push(format!(
            "Truncated: header declares {declared} frames, {present} present"
        ));
    } else if present > declared {
        report.warnings.push(format!(
            "File holds {present} frames, more than the {declared} declared"
        ));
    }

    if header.frame_rate.is_nan() || header.frame_rate <= 0.0 {
        report
            .warnings
            .push(format!("Frame rate {} is not positive", header.frame_rate));
    }

    Ok(report)
}
