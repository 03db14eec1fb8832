//! Video and sampling metadata types.
//!
//! [`VideoMetadata`] is probed once when a [`VideoSource`](crate::VideoSource)
//! is created. [`SamplingMetadata`] describes what a sampling run actually
//! resolved and is attached to every [`FrameSequence`](crate::FrameSequence)
//! for inclusion in a report.

use serde::Serialize;

/// Metadata probed from a video buffer.
///
/// `declared_duration` is what the container claims and may be `NaN` or
/// infinite; recordings written by browsers and phones frequently omit it.
///
/// # Example
///
/// ```no_run
/// use framegrab::VideoSource;
///
/// let source = VideoSource::from_bytes(std::fs::read("open.webm")?)?;
/// let metadata = source.metadata();
/// println!("{}x{}, declared {:.2}s", metadata.width, metadata.height, metadata.declared_duration);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct VideoMetadata {
    /// Size of the recorded buffer in bytes.
    pub byte_size: u64,
    /// Duration claimed by the container, in seconds. May be invalid.
    pub declared_duration: f64,
    /// Frame width in pixels (0 when the codec does not declare it up front).
    pub width: u32,
    /// Frame height in pixels (0 when the codec does not declare it up front).
    pub height: u32,
    /// Frames per second, if the stream declares a usable rate.
    pub frames_per_second: Option<f64>,
    /// Codec name (e.g. `"vp8"`, `"h264"`).
    pub codec: String,
    /// Container format name (e.g. `"matroska,webm"`, `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}

impl VideoMetadata {
    /// Returns `true` if the declared duration is finite and positive.
    pub fn has_valid_duration(&self) -> bool {
        self.declared_duration.is_finite() && self.declared_duration > 0.0
    }
}

/// How the effective duration of a sampling run was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSource {
    /// The container reported a usable duration.
    Reported,
    /// The duration became known after the recovery probe.
    Probed,
    /// Nothing usable was found; the configured fallback was used.
    Fallback,
}

/// Resolved metadata for one sampling run.
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct SamplingMetadata {
    /// Effective duration used to plan timestamps, in seconds.
    pub duration_seconds: f64,
    /// Where `duration_seconds` came from.
    pub duration_source: DurationSource,
    /// Decoded frame width in pixels.
    pub pixel_width: u32,
    /// Decoded frame height in pixels.
    pub pixel_height: u32,
    /// Size of the source buffer in bytes.
    pub byte_size: u64,
    /// Number of frames that were requested.
    pub requested_frames: usize,
    /// Number of planned timestamps that produced no frame.
    pub skipped_timestamps: usize,
}
