//! # framegrab
//!
//! Sample labelled still frames from recorded inspection videos.
//!
//! `framegrab` takes a recorded video buffer, often a browser or phone
//! recording whose container does not know its own duration, and produces a
//! fixed number of evenly spaced JPEG stills. Each still carries a burned-in
//! `Frame N` / `mm:ss` label. Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framegrab::{FrameSampler, SamplerOptions};
//!
//! let bytes = std::fs::read("recording.webm")?;
//! let sequence = FrameSampler::new(SamplerOptions::new()).sample_bytes(bytes)?;
//!
//! for frame in &sequence {
//!     frame.save(format!("frame_{:02}.jpg", frame.index()))?;
//! }
//! # Ok::<(), framegrab::FramegrabError>(())
//! ```
//!
//! ## How sampling works
//!
//! 1. **Duration**: use the reported duration if it is finite and positive,
//!    otherwise probe by seeking far ahead, otherwise assume 30 seconds.
//! 2. **Plan**: `N` timestamps from zero to just before the end.
//! 3. **Capture**: for each timestamp, seek (bounded), wait for a decoded
//!    frame (bounded), render it, reject it if its top-left corner is pure
//!    black, retry once, then label and encode it.
//!
//! Per-frame problems never fail the run. A [`FrameSequence`] may hold fewer
//! frames than requested, or none at all; only an empty or undecodable
//! buffer is an error.
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`FrameSampler::sample_async`] runs sampling on a Tokio blocking thread |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod capture;
pub mod config;
mod conversion;
pub mod decoder;
pub mod duration;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod metadata;
pub mod overlay;
pub mod progress;
pub mod report;
pub mod sampler;
pub mod source;
#[cfg(feature = "async")]
pub mod stream;
pub mod timeline;

pub use capture::{FrameOutcome, SkipReason, capture_at, is_blank};
pub use config::{
    DEFAULT_END_MARGIN, DEFAULT_FALLBACK_DURATION, DEFAULT_FRAME_COUNT, DEFAULT_PROBE_POSITION,
    SamplerOptions,
};
pub use decoder::{DecodeHandle, FfmpegDecoder, SeekOutcome};
pub use duration::{ResolvedDuration, resolve_duration, usable_duration};
pub use error::FramegrabError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame::{CapturedFrame, FrameSequence};
pub use metadata::{DurationSource, SamplingMetadata, VideoMetadata};
pub use overlay::{draw_label, format_timestamp};
pub use progress::{ProgressCallback, ProgressInfo};
pub use report::{CaptureStage, InspectionReport, VideoAnalysis};
pub use sampler::FrameSampler;
pub use source::VideoSource;
#[cfg(feature = "async")]
pub use stream::SampleFuture;
pub use timeline::plan_timestamps;
