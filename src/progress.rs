//! Progress reporting.
//!
//! This module provides [`ProgressCallback`] for monitoring a sampling run
//! and [`ProgressInfo`] for detailed progress snapshots. One snapshot is
//! delivered per planned timestamp, whether that timestamp produced a frame
//! or was skipped.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framegrab::{FrameSampler, ProgressCallback, ProgressInfo, SamplerOptions};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}/{} ({} kept)", info.current, info.total, info.frames_kept);
//!     }
//! }
//!
//! let options = SamplerOptions::new().with_progress(Arc::new(PrintProgress));
//! let sequence = FrameSampler::new(options).sample_bytes(std::fs::read("clip.webm")?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// A snapshot of sampling progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// How many timestamps have been processed so far.
    pub current: u64,
    /// Total number of planned timestamps.
    pub total: u64,
    /// Completion percentage (0.0 – 100.0).
    pub percentage: f32,
    /// Wall-clock time elapsed since sampling started.
    pub elapsed: Duration,
    /// Remaining time extrapolated from the pace so far.
    pub estimated_remaining: Option<Duration>,
    /// The nominal timestamp that was just processed.
    pub current_timestamp: Option<Duration>,
    /// Frames that made it into the output so far.
    pub frames_kept: u64,
}

/// Observer for a running sampling job.
///
/// Implementations must be [`Send`] and [`Sync`] because the sampler may run
/// on a blocking worker thread when the `async` feature is used. Callbacks
/// observe only; they cannot stop the run.
pub trait ProgressCallback: Send + Sync {
    /// Called after every planned timestamp, then once more with
    /// `current_timestamp: None` when the run is over.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Callback used when none is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _: &ProgressInfo) {}
}

/// Counts processed timestamps for one run and feeds the callback.
pub(crate) struct ProgressTracker {
    sink: Arc<dyn ProgressCallback>,
    total: u64,
    processed: u64,
    kept: u64,
    started: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(sink: Arc<dyn ProgressCallback>, total: u64) -> Self {
        Self {
            sink,
            total,
            processed: 0,
            kept: 0,
            started: Instant::now(),
        }
    }

    /// Record one processed timestamp and whether it produced a frame.
    pub(crate) fn advance(&mut self, timestamp: Duration, kept: bool) {
        self.processed += 1;
        self.kept += u64::from(kept);
        self.emit(Some(timestamp));
    }

    /// Emit the closing snapshot.
    pub(crate) fn finish(&mut self) {
        self.emit(None);
    }

    fn emit(&self, current_timestamp: Option<Duration>) {
        let elapsed = self.started.elapsed();
        let percentage = match self.total {
            0 => 100.0,
            total => self.processed as f32 * 100.0 / total as f32,
        };
        // Linear extrapolation from the average time per timestamp so far.
        let estimated_remaining = (self.processed > 0).then(|| {
            let left = self.total.saturating_sub(self.processed);
            elapsed.mul_f64(left as f64 / self.processed as f64)
        });

        self.sink.on_progress(&ProgressInfo {
            current: self.processed,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_timestamp,
            frames_kept: self.kept,
        });
    }
}
