//! Decode handles.
//!
//! A [`DecodeHandle`] is the stateful, seekable view onto a video's decoded
//! content that the sampler drives. It exposes exactly what the pipeline
//! needs and nothing about where the video came from: a possibly-invalid
//! reported duration, a deadline-bounded seek, a readiness poll, the current
//! pixel dimensions, and a way to render the current frame into a raster.
//!
//! [`FfmpegDecoder`] is the production implementation. Seeking lands on the
//! nearest keyframe at or before the target and decodes forward until a
//! frame at or after the target appears, the stream ends, or the deadline
//! passes, whichever comes first.

use std::path::Path;
use std::time::{Duration, Instant};

use ffmpeg_next::{
    Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::error::FramegrabError;

/// Frames whose presentation time is within this distance before the seek
/// target count as having reached it.
const TARGET_TOLERANCE_SECONDS: f64 = 0.001;

/// Largest raster side the FFmpeg handle will allocate.
const MAX_RASTER_SIDE: u32 = 16_384;

/// Decoding time one readiness poll may spend catching up to a seek target.
const DEFAULT_POLL_BUDGET: Duration = Duration::from_millis(100);

/// How a seek request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOutcome {
    /// The decoder reached the target (or the end of the stream).
    Settled,
    /// The deadline passed first; the current frame may be stale.
    TimedOut,
}

/// A seekable view onto decoded video content.
///
/// The sampler owns its handle exclusively for the whole run and never
/// issues overlapping requests, so implementations need no internal
/// synchronisation.
pub trait DecodeHandle {
    /// Duration reported by the media, in seconds.
    ///
    /// May be `NaN`, infinite, or non-positive when the container does not
    /// know it. Implementations may learn the real value later, for example
    /// after a seek has walked the stream to its end.
    fn reported_duration(&self) -> f64;

    /// Move to `target`, giving up at `deadline`.
    fn seek(&mut self, target: Duration, deadline: Instant) -> SeekOutcome;

    /// Returns `true` once a decoded frame with non-zero dimensions is
    /// available at the last seek target. May do a bounded amount of
    /// decoding work.
    fn poll_ready(&mut self) -> bool;

    /// Move past the current frame before a blank capture is retried,
    /// giving up at `deadline`. Handles whose picture changes on its own
    /// leave this as a no-op.
    fn advance(&mut self, _deadline: Instant) {}

    /// Pixel dimensions of the current decoded frame, `(0, 0)` if unknown.
    fn dimensions(&self) -> (u32, u32);

    /// Render the current frame into a `width`×`height` RGB raster.
    ///
    /// # Errors
    ///
    /// Returns [`FramegrabError::CaptureUnavailable`] when no raster can be
    /// produced for these dimensions.
    fn render(&mut self, width: u32, height: u32) -> Result<RgbImage, FramegrabError>;
}

/// Result of pulling the next frame out of the demuxer/decoder pair.
enum FrameStep {
    Frame(f64),
    Exhausted,
    DeadlineMissed,
}

struct CachedScaler {
    key: (Pixel, u32, u32, u32, u32),
    context: ScalingContext,
}

/// FFmpeg-backed [`DecodeHandle`] over a file on disk.
///
/// Usually obtained through [`VideoSource::open_decoder`](crate::VideoSource::open_decoder).
pub struct FfmpegDecoder {
    input: Input,
    decoder: VideoDecoder,
    stream_index: usize,
    time_base: Rational,
    container_duration: f64,
    stream_duration: f64,
    /// Latest presentation end time seen on the video stream.
    observed_end: Option<f64>,
    /// Set once the demuxer has hit end-of-file at least once.
    end_observed: bool,
    /// Set when the current position is at end-of-file.
    exhausted: bool,
    /// Target of a seek that timed out before a frame reached it.
    pending_target: Option<f64>,
    poll_budget: Duration,
    current: Option<VideoFrame>,
    scaler: Option<CachedScaler>,
}

impl FfmpegDecoder {
    /// Open the best video stream of the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`FramegrabError::FfmpegError`] if FFmpeg cannot open the file or
    ///   build a decoder for it.
    /// - [`FramegrabError::NoVideoStream`] if the file has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramegrabError> {
        ffmpeg_next::init()?;

        let input = ffmpeg_next::format::input(path.as_ref())?;

        let (stream_index, time_base, stream_duration, decoder) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or(FramegrabError::NoVideoStream)?;
            let time_base = stream.time_base();
            let stream_duration =
                crate::conversion::stream_duration_to_seconds(stream.duration(), time_base);
            let decoder_context = CodecContext::from_parameters(stream.parameters())?;
            let decoder = decoder_context.decoder().video()?;
            (stream.index(), time_base, stream_duration, decoder)
        };

        let container_duration = crate::conversion::container_duration_to_seconds(input.duration());

        log::debug!(
            "Opened decode handle: stream={}, {}x{}, container_duration={:.3}, stream_duration={:.3}",
            stream_index,
            decoder.width(),
            decoder.height(),
            container_duration,
            stream_duration,
        );

        Ok(Self {
            input,
            decoder,
            stream_index,
            time_base,
            container_duration,
            stream_duration,
            observed_end: None,
            end_observed: false,
            exhausted: false,
            pending_target: None,
            poll_budget: DEFAULT_POLL_BUDGET,
            current: None,
            scaler: None,
        })
    }

    /// Cap the decoding work a single [`DecodeHandle::poll_ready`] call does
    /// while catching up to a timed-out seek.
    #[must_use]
    pub fn with_poll_budget(mut self, budget: Duration) -> Self {
        self.poll_budget = budget;
        self
    }

    /// Container format name, e.g. `"matroska,webm"`.
    pub fn format_name(&self) -> String {
        self.input.format().name().to_string()
    }

    /// Codec name of the decoded stream.
    pub fn codec_name(&self) -> String {
        self.decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Average frame rate of the decoded stream, if declared.
    pub fn frames_per_second(&self) -> Option<f64> {
        let stream = self.input.stream(self.stream_index)?;
        let rate = stream.avg_frame_rate();
        if rate.denominator() != 0 && rate.numerator() > 0 {
            Some(rate.numerator() as f64 / rate.denominator() as f64)
        } else {
            None
        }
    }

    /// Record how far into the stream this packet reaches.
    fn observe(&mut self, packet: &Packet) {
        if let Some(pts) = packet.pts() {
            let end = crate::conversion::pts_to_seconds(
                pts.saturating_add(packet.duration().max(0)),
                self.time_base,
            );
            if self.observed_end.is_none_or(|known| end > known) {
                self.observed_end = Some(end);
            }
        }
    }

    /// Decode until one more frame comes out, the stream ends, or `deadline`
    /// passes.
    fn next_frame(&mut self, deadline: Option<Instant>) -> FrameStep {
        let mut decoded = VideoFrame::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let seconds = decoded
                    .timestamp()
                    .or(decoded.pts())
                    .map(|pts| crate::conversion::pts_to_seconds(pts, self.time_base))
                    .unwrap_or(0.0);
                self.current = Some(decoded);
                return FrameStep::Frame(seconds);
            }

            if self.exhausted {
                return FrameStep::Exhausted;
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return FrameStep::DeadlineMissed;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() != self.stream_index {
                        continue;
                    }
                    self.observe(&packet);
                    if let Err(error) = self.decoder.send_packet(&packet) {
                        log::trace!("Decoder rejected packet: {error}");
                    }
                }
                Err(ffmpeg_next::Error::Eof) => {
                    self.exhausted = true;
                    self.end_observed = true;
                    self.drain();
                }
                Err(error) => {
                    log::debug!("Demuxer stopped early: {error}");
                    self.exhausted = true;
                    self.drain();
                }
            }
        }
    }

    fn drain(&mut self) {
        if let Err(error) = self.decoder.send_eof() {
            log::trace!("Decoder refused end of stream: {error}");
        }
    }

    /// Decode until a frame reaches the pending seek target, or until any
    /// frame exists when nothing has been decoded since the last seek.
    /// Returns `false` if `deadline` passes first.
    fn catch_up(&mut self, deadline: Instant) -> bool {
        while self.pending_target.is_some() || self.current.is_none() {
            match self.next_frame(Some(deadline)) {
                FrameStep::Frame(seconds) => {
                    if self.pending_target.is_none_or(|target| reaches_target(seconds, target)) {
                        self.pending_target = None;
                    }
                }
                FrameStep::Exhausted => {
                    self.pending_target = None;
                    break;
                }
                FrameStep::DeadlineMissed => return false,
            }
        }
        true
    }

    fn raster_from_current(&mut self, width: u32, height: u32) -> Result<RgbImage, FramegrabError> {
        let Some(frame) = self.current.as_ref() else {
            // Nothing decoded yet: same as drawing an unloaded video, a black raster.
            return Ok(RgbImage::new(width, height));
        };

        let key = (frame.format(), frame.width(), frame.height(), width, height);
        if self.scaler.as_ref().is_none_or(|cached| cached.key != key) {
            let context = ScalingContext::get(
                frame.format(),
                frame.width(),
                frame.height(),
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?;
            self.scaler = Some(CachedScaler { key, context });
        }

        let Some(scaler) = self.scaler.as_mut() else {
            return Err(FramegrabError::CaptureUnavailable(
                "scaler unavailable".to_string(),
            ));
        };

        let mut rgb_frame = VideoFrame::empty();
        scaler.context.run(frame, &mut rgb_frame)?;

        let buffer = crate::conversion::packed_rgb(&rgb_frame, width, height);
        RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            FramegrabError::CaptureUnavailable(format!(
                "decoded data does not fill a {width}x{height} raster"
            ))
        })
    }
}

impl DecodeHandle for FfmpegDecoder {
    fn reported_duration(&self) -> f64 {
        pick_duration(
            self.container_duration,
            self.stream_duration,
            self.observed_end.filter(|_| self.end_observed),
        )
    }

    fn seek(&mut self, target: Duration, deadline: Instant) -> SeekOutcome {
        // A frame from before the seek never counts as the new position.
        self.current = None;
        self.pending_target = None;

        let timestamp = crate::conversion::duration_to_seek_timestamp(target);
        match self.input.seek(timestamp, ..timestamp) {
            Ok(()) => {
                self.decoder.flush();
                self.exhausted = false;
            }
            Err(error) => {
                // Keep reading from wherever the demuxer is; for a duration
                // probe that still walks the stream to its end.
                log::debug!("Seek to {:.3}s rejected: {error}", target.as_secs_f64());
            }
        }

        let target_seconds = target.as_secs_f64();
        loop {
            match self.next_frame(Some(deadline)) {
                FrameStep::Frame(seconds) if reaches_target(seconds, target_seconds) => {
                    return SeekOutcome::Settled;
                }
                FrameStep::Frame(_) => {}
                FrameStep::Exhausted => return SeekOutcome::Settled,
                FrameStep::DeadlineMissed => {
                    self.pending_target = Some(target_seconds);
                    return SeekOutcome::TimedOut;
                }
            }
        }
    }

    fn poll_ready(&mut self) -> bool {
        if !self.catch_up(Instant::now() + self.poll_budget) {
            return false;
        }
        let (width, height) = self.dimensions();
        self.current.is_some() && width > 0 && height > 0
    }

    fn advance(&mut self, deadline: Instant) {
        if self.pending_target.is_some() || self.current.is_none() {
            self.catch_up(deadline);
        } else if let FrameStep::DeadlineMissed = self.next_frame(Some(deadline)) {
            log::trace!("No newer frame decoded before the retry deadline");
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        match &self.current {
            Some(frame) => (frame.width(), frame.height()),
            None => (self.decoder.width(), self.decoder.height()),
        }
    }

    fn render(&mut self, width: u32, height: u32) -> Result<RgbImage, FramegrabError> {
        if width == 0 || height == 0 || width > MAX_RASTER_SIDE || height > MAX_RASTER_SIDE {
            return Err(FramegrabError::CaptureUnavailable(format!(
                "cannot allocate a {width}x{height} raster"
            )));
        }
        self.raster_from_current(width, height)
    }
}

/// Whether a frame presented at `frame_seconds` counts as the seek target.
fn reaches_target(frame_seconds: f64, target_seconds: f64) -> bool {
    frame_seconds + TARGET_TOLERANCE_SECONDS >= target_seconds
}

/// Container duration first, then stream duration, then the end of the
/// stream as observed by decoding through it. `NaN` when none is usable.
fn pick_duration(container: f64, stream: f64, observed_end: Option<f64>) -> f64 {
    [Some(container), Some(stream), observed_end]
        .into_iter()
        .flatten()
        .find(|seconds| seconds.is_finite() && *seconds > 0.0)
        .unwrap_or(f64::NAN)
}
