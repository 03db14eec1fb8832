//! Sampling configuration.
//!
//! [`SamplerOptions`] is a builder that threads the pipeline's tuning knobs
//! (frame count, wait budgets, retry pause, JPEG quality, fallbacks) and an
//! optional progress callback through [`FrameSampler`](crate::FrameSampler)
//! without polluting every function signature.
//!
//! Every wait in the pipeline is bounded by one of these budgets, so a
//! sampling run always terminates even if the decoder never produces a
//! usable frame.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use framegrab::SamplerOptions;
//!
//! let options = SamplerOptions::new()
//!     .with_frame_count(12)
//!     .with_jpeg_quality(70)
//!     .with_seek_timeout(Duration::from_secs(2));
//! assert_eq!(options.frame_count(), 12);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::progress::{NoOpProgress, ProgressCallback};

/// Number of frames sampled when no count is configured.
pub const DEFAULT_FRAME_COUNT: usize = 10;

/// Duration assumed when the real one cannot be recovered.
pub const DEFAULT_FALLBACK_DURATION: Duration = Duration::from_secs(30);

/// Position used to coax an unknown duration out of the decoder.
///
/// Well past any plausible inspection clip, but far from values that make
/// demuxers misbehave.
pub const DEFAULT_PROBE_POSITION: Duration = Duration::from_secs(3600);

/// Distance kept from the end of the video so the last sample never lands
/// on the end-of-stream.
pub const DEFAULT_END_MARGIN: Duration = Duration::from_millis(50);

/// Configuration for a sampling run.
///
/// All fields have sensible defaults; a default-constructed value samples ten
/// frames, waits up to 1.5 s per seek and 1 s for readiness, retries a blank
/// capture once after 150 ms, and encodes JPEGs at quality 80.
#[derive(Clone)]
pub struct SamplerOptions {
    pub(crate) frame_count: usize,
    pub(crate) seek_timeout: Duration,
    pub(crate) readiness_attempts: u32,
    pub(crate) readiness_interval: Duration,
    pub(crate) retry_pause: Duration,
    pub(crate) jpeg_quality: u8,
    pub(crate) fallback_duration: Duration,
    pub(crate) probe_position: Duration,
    pub(crate) end_margin: Duration,
    pub(crate) fallback_dimensions: (u32, u32),
    pub(crate) blank_region: u32,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for SamplerOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SamplerOptions")
            .field("frame_count", &self.frame_count)
            .field("seek_timeout", &self.seek_timeout)
            .field("readiness_attempts", &self.readiness_attempts)
            .field("readiness_interval", &self.readiness_interval)
            .field("retry_pause", &self.retry_pause)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("fallback_duration", &self.fallback_duration)
            .field("probe_position", &self.probe_position)
            .field("end_margin", &self.end_margin)
            .field("fallback_dimensions", &self.fallback_dimensions)
            .field("blank_region", &self.blank_region)
            .finish_non_exhaustive()
    }
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerOptions {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            seek_timeout: Duration::from_millis(1500),
            readiness_attempts: 10,
            readiness_interval: Duration::from_millis(100),
            retry_pause: Duration::from_millis(150),
            jpeg_quality: 80,
            fallback_duration: DEFAULT_FALLBACK_DURATION,
            probe_position: DEFAULT_PROBE_POSITION,
            end_margin: DEFAULT_END_MARGIN,
            fallback_dimensions: (640, 360),
            blank_region: 10,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set how many frames to sample. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_frame_count(mut self, count: usize) -> Self {
        self.frame_count = count.max(1);
        self
    }

    /// Set the upper bound on waiting for a seek to settle.
    ///
    /// A seek that misses this deadline is not an error; the capture simply
    /// uses whatever frame the decoder holds at that point.
    #[must_use]
    pub fn with_seek_timeout(mut self, timeout: Duration) -> Self {
        self.seek_timeout = timeout;
        self
    }

    /// Set the readiness poll budget: at most `attempts` polls, `interval`
    /// apart.
    #[must_use]
    pub fn with_readiness(mut self, attempts: u32, interval: Duration) -> Self {
        self.readiness_attempts = attempts;
        self.readiness_interval = interval;
        self
    }

    /// Set the pause before the single retry of a blank capture.
    #[must_use]
    pub fn with_retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = pause;
        self
    }

    /// Set the JPEG quality factor. Clamped to `1..=100`.
    ///
    /// Lower values trade image fidelity for a smaller downstream archive.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Set the duration assumed when neither the container nor the probe
    /// yields a usable one. Zero is ignored.
    #[must_use]
    pub fn with_fallback_duration(mut self, duration: Duration) -> Self {
        if !duration.is_zero() {
            self.fallback_duration = duration;
        }
        self
    }

    /// Set the seek target used to recover an unknown duration.
    #[must_use]
    pub fn with_probe_position(mut self, position: Duration) -> Self {
        self.probe_position = position;
        self
    }

    /// Set the safety margin kept before the end of the video.
    #[must_use]
    pub fn with_end_margin(mut self, margin: Duration) -> Self {
        self.end_margin = margin;
        self
    }

    /// Set the raster size used when the decoder reports zero dimensions.
    /// Zero values are clamped to 1.
    #[must_use]
    pub fn with_fallback_dimensions(mut self, width: u32, height: u32) -> Self {
        self.fallback_dimensions = (width.max(1), height.max(1));
        self
    }

    /// Set the side of the top-left square inspected by the blank-frame check.
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_blank_region(mut self, side: u32) -> Self {
        self.blank_region = side.max(1);
        self
    }

    /// Attach a progress callback, invoked once per planned timestamp.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Number of frames that will be requested.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// JPEG quality factor in `1..=100`.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Upper bound on a single seek.
    pub fn seek_timeout(&self) -> Duration {
        self.seek_timeout
    }
}
