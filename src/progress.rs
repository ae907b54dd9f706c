//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for observing a conversion,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`] for
//! progress snapshots. Progress is a side channel: callbacks observe the
//! pipeline but never steer it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framestream::{ConvertOptions, FrameStreamError, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(fraction) = info.fraction {
//!             println!("{:.1}% complete", fraction * 100.0);
//!         }
//!     }
//! }
//!
//! let options = ConvertOptions::new().with_progress(Arc::new(PrintProgress));
//! let report = framestream::convert("input.mp4", "frames.data", &options)?;
//! println!("{} frames written", report.frames_written);
//! # Ok::<(), FrameStreamError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Converting a video into a frame stream.
    FrameConversion,
}

/// A snapshot of conversion progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// Frames written so far.
    pub current: u64,
    /// Frames the source declared, if known.
    pub total: Option<u64>,
    /// `current / total`, if `total` is known and non-zero.
    ///
    /// Monotonically increasing over the life of one operation.
    pub fraction: Option<f64>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
}

/// Trait for receiving progress updates during a conversion.
///
/// Implementations must be [`Send`] and [`Sync`] so the same callback can be
/// shared with other threads (a UI thread, for instance).
///
/// Progress callbacks are **infallible**: they observe but cannot halt the
/// operation. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called after frames are written.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to stop the
/// associated conversion before its next frame.
///
/// # Example
///
/// ```
/// use framestream::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones of this token observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks progress timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one completed item and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report();
            self.items_since_last_report = 0;
        }
    }

    /// Emit a final report unless the last `advance` already did.
    pub(crate) fn finish(&mut self) {
        if self.items_since_last_report > 0 || self.current == 0 {
            self.report();
            self.items_since_last_report = 0;
        }
    }

    fn report(&self) {
        let elapsed = self.start_time.elapsed();

        let fraction = self
            .total
            .filter(|&total| total > 0)
            .map(|total| self.current as f64 / total as f64);

        let estimated_remaining = if self.current > 0 {
            self.total.map(|total| {
                let remaining = total.saturating_sub(self.current);
                elapsed.div_f64(self.current as f64).mul_f64(remaining as f64)
            })
        } else {
            None
        };

        let info = ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            fraction,
            elapsed,
            estimated_remaining,
        };

        self.callback.on_progress(&info);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        infos: Mutex<Vec<ProgressInfo>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.infos.lock().unwrap().push(info.clone());
        }
    }

    #[test]
    fn reports_every_batch_and_final_remainder() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), OperationType::FrameConversion, Some(5), 2);
        for _ in 0..5 {
            tracker.advance();
        }
        tracker.finish();

        let currents: Vec<u64> = recorder
            .infos
            .lock()
            .unwrap()
            .iter()
            .map(|info| info.current)
            .collect();
        assert_eq!(currents, vec![2, 4, 5]);
    }

    #[test]
    fn finish_does_not_repeat_last_report() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), OperationType::FrameConversion, Some(2), 1);
        tracker.advance();
        tracker.advance();
        tracker.finish();
        assert_eq!(recorder.infos.lock().unwrap().len(), 2);
    }

    #[test]
    fn fraction_is_none_for_unknown_total() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), OperationType::FrameConversion, Some(0), 1);
        tracker.finish();
        let infos = recorder.infos.lock().unwrap();
        assert_eq!(infos.len(), 1);
        assert!(infos[0].fraction.is_none());
    }

    #[test]
    fn fraction_reaches_one() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), OperationType::FrameConversion, Some(4), 1);
        for _ in 0..4 {
            tracker.advance();
        }
        let infos = recorder.infos.lock().unwrap();
        assert_eq!(infos.last().and_then(|info| info.fraction), Some(1.0));
    }
}
