//! Seek, capture and validate one sample timestamp.
//!
//! Each timestamp walks a small state machine:
//!
//! ```text
//! Seeking ─► Waiting ─► Capturing ─► Valid ─────────────► Encoded
//!                          │   ▲        (overlay + JPEG)
//!                          │   └── Retrying (pause, advance, once)
//!                          ▼
//!                        Blank (second time) / Unavailable ──► Skipped
//! ```
//!
//! Nothing in here returns an error to the sampler. A slow seek or a decoder
//! that never reports readiness only means the capture runs against
//! whatever frame the handle currently holds; a raster that cannot be built,
//! a second blank capture, or a failed encode all end in
//! [`FrameOutcome::Skipped`].

use std::thread;
use std::time::{Duration, Instant};

use image::RgbImage;

use crate::config::SamplerOptions;
use crate::decoder::{DecodeHandle, SeekOutcome};
use crate::frame::{CapturedFrame, encode_jpeg};
use crate::overlay::draw_label;

/// Why a timestamp contributed no frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No raster could be produced at this position.
    CaptureUnavailable,
    /// The capture was blank, and so was the retry.
    Blank,
    /// The raster was valid but JPEG encoding failed.
    EncodeFailed,
}

/// Terminal state of one timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A labelled, encoded frame.
    Encoded(CapturedFrame),
    /// The timestamp is dropped.
    Skipped(SkipReason),
}

enum CaptureState {
    Seeking,
    Waiting,
    Capturing { retried: bool },
    Retrying,
    Valid(RgbImage),
    Done(FrameOutcome),
}

/// Returns `true` when every channel of every pixel in the top-left
/// `region`×`region` square (clipped to the raster) is zero.
///
/// Legitimately dark footage can trip this check; a pure black corner is
/// treated as a decoder that has not produced a picture yet.
pub fn is_blank(image: &RgbImage, region: u32) -> bool {
    let width = region.min(image.width());
    let height = region.min(image.height());
    (0..height).all(|y| (0..width).all(|x| image.get_pixel(x, y).0 == [0, 0, 0]))
}

/// Capture the frame at `timestamp` and label it with `index`.
///
/// `index` is both burned into the label and stored on the returned frame,
/// so callers pass the position the frame will take in the sequence.
pub fn capture_at<H: DecodeHandle + ?Sized>(
    handle: &mut H,
    index: u32,
    timestamp: Duration,
    options: &SamplerOptions,
) -> FrameOutcome {
    let mut state = CaptureState::Seeking;
    loop {
        state = match state {
            CaptureState::Seeking => {
                let deadline = Instant::now() + options.seek_timeout;
                if handle.seek(timestamp, deadline) == SeekOutcome::TimedOut {
                    log::debug!(
                        "Seek to {:.3}s timed out; capturing the current frame",
                        timestamp.as_secs_f64()
                    );
                }
                CaptureState::Waiting
            }
            CaptureState::Waiting => {
                if !wait_until_ready(handle, options) {
                    log::debug!(
                        "Decoder not ready at {:.3}s after {} polls",
                        timestamp.as_secs_f64(),
                        options.readiness_attempts
                    );
                }
                CaptureState::Capturing { retried: false }
            }
            CaptureState::Capturing { retried } => {
                let (width, height) = capture_dimensions(handle, options);
                match handle.render(width, height) {
                    Err(error) => {
                        log::debug!("Capture at {:.3}s unavailable: {error}", timestamp.as_secs_f64());
                        CaptureState::Done(FrameOutcome::Skipped(SkipReason::CaptureUnavailable))
                    }
                    Ok(raster) if !is_blank(&raster, options.blank_region) => CaptureState::Valid(raster),
                    Ok(_) if !retried => CaptureState::Retrying,
                    Ok(_) => {
                        log::debug!("Blank capture at {:.3}s after retry", timestamp.as_secs_f64());
                        CaptureState::Done(FrameOutcome::Skipped(SkipReason::Blank))
                    }
                }
            }
            CaptureState::Retrying => {
                thread::sleep(options.retry_pause);
                handle.advance(Instant::now() + options.readiness_interval);
                CaptureState::Capturing { retried: true }
            }
            CaptureState::Valid(mut raster) => {
                draw_label(&mut raster, index, timestamp);
                match encode_jpeg(&raster, options.jpeg_quality) {
                    Ok(data) => CaptureState::Done(FrameOutcome::Encoded(CapturedFrame {
                        index,
                        timestamp,
                        width: raster.width(),
                        height: raster.height(),
                        data,
                    })),
                    Err(error) => {
                        log::warn!("JPEG encoding failed at {:.3}s: {error}", timestamp.as_secs_f64());
                        CaptureState::Done(FrameOutcome::Skipped(SkipReason::EncodeFailed))
                    }
                }
            }
            CaptureState::Done(outcome) => return outcome,
        };
    }
}

/// Poll the handle until it is ready or the poll budget runs out.
fn wait_until_ready<H: DecodeHandle + ?Sized>(handle: &mut H, options: &SamplerOptions) -> bool {
    for attempt in 0..options.readiness_attempts {
        if handle.poll_ready() {
            return true;
        }
        if attempt + 1 < options.readiness_attempts {
            thread::sleep(options.readiness_interval);
        }
    }
    false
}

fn capture_dimensions<H: DecodeHandle + ?Sized>(handle: &H, options: &SamplerOptions) -> (u32, u32) {
    match handle.dimensions() {
        (0, _) | (_, 0) => options.fallback_dimensions,
        dimensions => dimensions,
    }
}
