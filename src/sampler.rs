//! The frame sampler.
//!
//! [`FrameSampler`] runs the whole pipeline against one decode handle:
//! resolve the effective duration, plan evenly spaced timestamps, then
//! capture each timestamp in order. Timestamps that produce no frame are
//! dropped without using up an index, so kept frames are numbered `1..=k`.
//!
//! Sampling itself never fails. The only errors come from turning a byte
//! buffer into something decodable in the first place, see
//! [`VideoSource::from_bytes`].

use crate::capture::{FrameOutcome, capture_at};
use crate::config::SamplerOptions;
use crate::decoder::DecodeHandle;
use crate::duration::resolve_duration;
use crate::error::FramegrabError;
use crate::frame::FrameSequence;
use crate::metadata::SamplingMetadata;
use crate::progress::ProgressTracker;
use crate::source::VideoSource;
use crate::timeline::plan_timestamps;

/// Samples a fixed number of labelled frames from a video.
///
/// # Example
///
/// ```no_run
/// use framegrab::{FrameSampler, SamplerOptions};
///
/// let sampler = FrameSampler::new(SamplerOptions::new().with_frame_count(10));
/// let sequence = sampler.sample_bytes(std::fs::read("open.webm")?)?;
///
/// for frame in &sequence {
///     frame.save(format!("frame_{:02}.jpg", frame.index()))?;
/// }
/// println!(
///     "{} of {} frames over {:.1}s",
///     sequence.len(),
///     sequence.metadata().requested_frames,
///     sequence.metadata().duration_seconds,
/// );
/// # Ok::<(), framegrab::FramegrabError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FrameSampler {
    options: SamplerOptions,
}

impl FrameSampler {
    /// Create a sampler with the given options.
    pub fn new(options: SamplerOptions) -> Self {
        Self { options }
    }

    /// The options this sampler runs with.
    pub fn options(&self) -> &SamplerOptions {
        &self.options
    }

    /// Sample frames from an already-probed source.
    ///
    /// A fresh decode handle is opened for the run and dropped before this
    /// returns. The source itself stays usable.
    ///
    /// # Errors
    ///
    /// Returns [`FramegrabError::SourceReleased`] if the source was released,
    /// or an error if the decode handle cannot be opened.
    pub fn sample(&self, source: &VideoSource) -> Result<FrameSequence, FramegrabError> {
        let mut decoder = source
            .open_decoder()?
            .with_poll_budget(self.options.readiness_interval);
        Ok(self.sample_with_handle(&mut decoder, source.byte_size()))
    }

    /// Sample frames from a raw video buffer.
    ///
    /// The buffer's temporary backing file is released before this returns,
    /// whether sampling produced frames or not.
    ///
    /// # Errors
    ///
    /// Returns [`FramegrabError::EmptyInput`], [`FramegrabError::SourceOpen`]
    /// or [`FramegrabError::NoVideoStream`] when the buffer is not a
    /// decodable video.
    pub fn sample_bytes(&self, bytes: Vec<u8>) -> Result<FrameSequence, FramegrabError> {
        let mut source = VideoSource::from_bytes(bytes)?;
        let result = self.sample(&source);
        source.release();
        result
    }

    /// Run the pipeline against any decode handle.
    ///
    /// `byte_size` is only recorded in the returned metadata.
    pub fn sample_with_handle<H: DecodeHandle + ?Sized>(
        &self,
        handle: &mut H,
        byte_size: u64,
    ) -> FrameSequence {
        let options = &self.options;
        let resolved = resolve_duration(handle, options);
        let plan = plan_timestamps(resolved.duration, options.frame_count, options.end_margin);

        log::info!(
            "Sampling {} frames over {:.3}s ({:?} duration)",
            plan.len(),
            resolved.duration.as_secs_f64(),
            resolved.source,
        );

        let mut tracker = ProgressTracker::new(options.progress.clone(), plan.len() as u64);
        let mut frames = Vec::with_capacity(plan.len());
        let mut skipped = 0;

        for (position, timestamp) in plan.iter().enumerate() {
            // Kept frames are numbered 1..=k; the label carries the same index.
            let index = frames.len() as u32 + 1;
            match capture_at(handle, index, *timestamp, options) {
                FrameOutcome::Encoded(frame) => {
                    frames.push(frame);
                    tracker.advance(*timestamp, true);
                }
                FrameOutcome::Skipped(reason) => {
                    log::debug!(
                        "Timestamp {} at {:.3}s skipped: {reason:?}",
                        position + 1,
                        timestamp.as_secs_f64()
                    );
                    skipped += 1;
                    tracker.advance(*timestamp, false);
                }
            }
        }
        tracker.finish();

        if frames.is_empty() {
            log::warn!("No usable frames captured from {} planned timestamps", plan.len());
        } else if skipped > 0 {
            log::info!("Captured {} frames, skipped {skipped}", frames.len());
        }

        let (pixel_width, pixel_height) = frames
            .first()
            .map(|frame| (frame.width, frame.height))
            .unwrap_or_else(|| handle.dimensions());

        FrameSequence {
            frames,
            metadata: SamplingMetadata {
                duration_seconds: resolved.duration.as_secs_f64(),
                duration_source: resolved.source,
                pixel_width,
                pixel_height,
                byte_size,
                requested_frames: options.frame_count,
                skipped_timestamps: skipped,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::{Duration, Instant};

    use image::{Rgb, RgbImage};

    use super::*;
    use crate::decoder::SeekOutcome;
    use crate::frame::CapturedFrame;
    use crate::metadata::DurationSource;
    use crate::overlay::draw_label;

    /// Renders a raster whose colour encodes the current position. Positions
    /// listed in `blank_at` always render black.
    struct FakeVideo {
        duration: f64,
        position: Duration,
        blank_at: Vec<Duration>,
        seeks: Vec<Duration>,
        size: (u32, u32),
    }

    impl FakeVideo {
        fn new(duration: f64) -> Self {
            Self {
                duration,
                position: Duration::ZERO,
                blank_at: Vec::new(),
                seeks: Vec::new(),
                size: (96, 54),
            }
        }
    }

    impl DecodeHandle for FakeVideo {
        fn reported_duration(&self) -> f64 {
            self.duration
        }

        fn seek(&mut self, target: Duration, _deadline: Instant) -> SeekOutcome {
            self.position = target;
            self.seeks.push(target);
            SeekOutcome::Settled
        }

        fn poll_ready(&mut self) -> bool {
            true
        }

        fn dimensions(&self) -> (u32, u32) {
            self.size
        }

        fn render(&mut self, width: u32, height: u32) -> Result<RgbImage, FramegrabError> {
            if self.blank_at.contains(&self.position) {
                return Ok(RgbImage::new(width, height));
            }
            let shade = 20 + (self.position.as_millis() / 100 % 200) as u8;
            Ok(RgbImage::from_pixel(width, height, Rgb([shade, 255 - shade, 90])))
        }
    }

    fn sampler() -> FrameSampler {
        FrameSampler::new(
            SamplerOptions::new()
                .with_readiness(1, Duration::ZERO)
                .with_retry_pause(Duration::from_millis(1)),
        )
    }

    #[test]
    fn finite_video_yields_all_frames() {
        let mut video = FakeVideo::new(12.0);
        let sequence = sampler().sample_with_handle(&mut video, 4096);

        assert_eq!(sequence.len(), 10);
        let indices: Vec<u32> = sequence.iter().map(|frame| frame.index()).collect();
        assert_eq!(indices, (1..=10).collect::<Vec<_>>());

        let distinct: HashSet<&[u8]> = sequence.iter().map(|frame| frame.jpeg_bytes()).collect();
        assert_eq!(distinct.len(), 10);

        let metadata = sequence.metadata();
        assert_eq!(metadata.duration_seconds, 12.0);
        assert_eq!(metadata.duration_source, DurationSource::Reported);
        assert_eq!((metadata.pixel_width, metadata.pixel_height), (96, 54));
        assert_eq!(metadata.byte_size, 4096);
        assert_eq!(metadata.skipped_timestamps, 0);
    }

    #[test]
    fn unknown_duration_falls_back_to_thirty_seconds() {
        let mut video = FakeVideo::new(f64::NAN);
        let sequence = sampler().sample_with_handle(&mut video, 1);

        assert_eq!(sequence.len(), 10);
        assert_eq!(sequence.metadata().duration_seconds, 30.0);
        assert_eq!(sequence.metadata().duration_source, DurationSource::Fallback);
        assert!((sequence.frames()[1].timestamp_seconds() - 10.0 / 3.0).abs() < 0.001);
        assert_eq!(sequence.frames()[9].timestamp(), Duration::from_millis(29_950));
    }

    #[test]
    fn blank_timestamps_are_dropped_and_renumbered() {
        let mut video = FakeVideo::new(12.0);
        let plan = plan_timestamps(Duration::from_secs(12), 10, Duration::from_millis(50));
        video.blank_at = vec![plan[2], plan[5], plan[8]];

        let sequence = sampler().sample_with_handle(&mut video, 1);

        assert_eq!(sequence.len(), 7);
        assert_eq!(sequence.metadata().skipped_timestamps, 3);
        let indices: Vec<u32> = sequence.iter().map(|frame| frame.index()).collect();
        assert_eq!(indices, (1..=7).collect::<Vec<_>>());
        assert!(sequence.iter().all(|frame| !video.blank_at.contains(&frame.timestamp())));
        assert!(sequence.frames().windows(2).all(|pair| pair[0].timestamp() < pair[1].timestamp()));
    }

    /// Sum of absolute channel differences over the label box.
    fn label_difference(frame: &CapturedFrame, expected: &RgbImage) -> u64 {
        let decoded = frame.to_image().unwrap().to_rgb8();
        let mut total = 0u64;
        for y in 0..80.min(decoded.height()) {
            for x in 0..220.min(decoded.width()) {
                let actual = decoded.get_pixel(x, y).0;
                let wanted = expected.get_pixel(x, y).0;
                for channel in 0..3 {
                    total += u64::from(actual[channel].abs_diff(wanted[channel]));
                }
            }
        }
        total
    }

    #[test]
    fn burned_in_label_matches_index_after_skip() {
        let mut video = FakeVideo::new(12.0);
        let plan = plan_timestamps(Duration::from_secs(12), 10, Duration::from_millis(50));
        video.blank_at = vec![plan[1]];
        video.size = (320, 180);

        let sampler = FrameSampler::new(
            SamplerOptions::new()
                .with_readiness(1, Duration::ZERO)
                .with_retry_pause(Duration::from_millis(1))
                .with_jpeg_quality(100),
        );
        let sequence = sampler.sample_with_handle(&mut video, 1);
        assert_eq!(sequence.len(), 9);

        let frame = &sequence.frames()[1];
        assert_eq!(frame.index(), 2);
        assert_eq!(frame.timestamp(), plan[2]);

        video.position = frame.timestamp();
        let raster = video.render(frame.width(), frame.height()).unwrap();
        let mut same_index = raster.clone();
        draw_label(&mut same_index, frame.index(), frame.timestamp());
        let mut planned_index = raster;
        draw_label(&mut planned_index, 3, frame.timestamp());

        assert!(
            label_difference(frame, &same_index) < label_difference(frame, &planned_index),
            "label does not show index {}",
            frame.index()
        );
    }

    #[test]
    fn never_visible_video_yields_empty_sequence() {
        let mut video = FakeVideo::new(5.0);
        video.blank_at = plan_timestamps(Duration::from_secs(5), 10, Duration::from_millis(50));

        let sequence = sampler().sample_with_handle(&mut video, 1);
        assert!(sequence.is_empty());
        assert_eq!(sequence.metadata().skipped_timestamps, 10);
        assert_eq!(sequence.metadata().pixel_width, 96);
    }

    #[test]
    fn seeks_follow_the_plan_in_order() {
        let mut video = FakeVideo::new(8.0);
        let sampler = FrameSampler::new(
            SamplerOptions::new()
                .with_frame_count(5)
                .with_readiness(1, Duration::ZERO),
        );
        sampler.sample_with_handle(&mut video, 1);
        assert_eq!(
            video.seeks,
            plan_timestamps(Duration::from_secs(8), 5, Duration::from_millis(50))
        );
    }

    #[test]
    fn single_frame_is_taken_at_zero() {
        let mut video = FakeVideo::new(3.0);
        let sampler = FrameSampler::new(SamplerOptions::new().with_frame_count(1));
        let sequence = sampler.sample_with_handle(&mut video, 1);
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence.frames()[0].timestamp(), Duration::ZERO);
    }
}
