//! Sampling pipeline integration tests.
//!
//! These drive [`FrameSampler::sample_with_handle`] with a scripted decode
//! handle, so they need neither FFmpeg fixtures nor real video.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use framegrab::{
    DecodeHandle, DurationSource, FrameSampler, FramegrabError, ProgressCallback, ProgressInfo,
    SamplerOptions, SeekOutcome, plan_timestamps,
};
use image::{Rgb, RgbImage};

/// A decode handle with scripted behaviour.
struct ScriptedVideo {
    /// Duration reported before any seek.
    duration: f64,
    /// Duration reported once a seek has happened.
    duration_after_seek: f64,
    dimensions: (u32, u32),
    position: Duration,
    seeked: bool,
    /// Positions that always render black.
    blank_at: Vec<Duration>,
    /// Positions that render black only on the first attempt.
    warm_up_at: Vec<Duration>,
    /// Every seek times out.
    slow_seeks: bool,
    /// Rendering always fails.
    no_render: bool,
    renders: usize,
}

impl ScriptedVideo {
    fn new(duration: f64) -> Self {
        Self {
            duration,
            duration_after_seek: duration,
            dimensions: (160, 90),
            position: Duration::ZERO,
            seeked: false,
            blank_at: Vec::new(),
            warm_up_at: Vec::new(),
            slow_seeks: false,
            no_render: false,
            renders: 0,
        }
    }
}

impl DecodeHandle for ScriptedVideo {
    fn reported_duration(&self) -> f64 {
        if self.seeked {
            self.duration_after_seek
        } else {
            self.duration
        }
    }

    fn seek(&mut self, target: Duration, _deadline: Instant) -> SeekOutcome {
        self.seeked = true;
        self.position = target;
        if self.slow_seeks {
            SeekOutcome::TimedOut
        } else {
            SeekOutcome::Settled
        }
    }

    fn poll_ready(&mut self) -> bool {
        self.dimensions != (0, 0)
    }

    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn render(&mut self, width: u32, height: u32) -> Result<RgbImage, FramegrabError> {
        self.renders += 1;
        if self.no_render {
            return Err(FramegrabError::CaptureUnavailable("no raster".to_string()));
        }
        if self.blank_at.contains(&self.position) {
            return Ok(RgbImage::new(width, height));
        }
        if let Some(slot) = self.warm_up_at.iter().position(|at| *at == self.position) {
            self.warm_up_at.remove(slot);
            return Ok(RgbImage::new(width, height));
        }
        let shade = (self.position.as_millis() / 50 % 250) as u8;
        Ok(RgbImage::from_fn(width, height, |x, _| {
            Rgb([shade, (x % 256) as u8, 255 - shade])
        }))
    }
}

fn quick_options() -> SamplerOptions {
    SamplerOptions::new()
        .with_readiness(2, Duration::from_millis(1))
        .with_retry_pause(Duration::from_millis(1))
}

fn default_plan(seconds: u64) -> Vec<Duration> {
    plan_timestamps(
        Duration::from_secs(seconds),
        framegrab::DEFAULT_FRAME_COUNT,
        framegrab::DEFAULT_END_MARGIN,
    )
}

// ── End-to-end scenarios ───────────────────────────────────────────

#[test]
fn twelve_second_video_gives_ten_distinct_frames() {
    let mut video = ScriptedVideo::new(12.0);
    let sequence = FrameSampler::new(quick_options()).sample_with_handle(&mut video, 2_000_000);

    assert_eq!(sequence.len(), 10);
    let timestamps: Vec<f64> = sequence.iter().map(|frame| frame.timestamp_seconds()).collect();
    assert_eq!(timestamps[0], 0.0);
    assert!((timestamps[1] - 1.333).abs() < 0.001);
    assert!((timestamps[2] - 2.667).abs() < 0.001);
    assert!((timestamps[9] - 11.95).abs() < 1e-9);

    let distinct: HashSet<Vec<u8>> = sequence
        .iter()
        .map(|frame| frame.jpeg_bytes().to_vec())
        .collect();
    assert_eq!(distinct.len(), 10);

    for frame in &sequence {
        assert_eq!((frame.width(), frame.height()), (160, 90));
        assert_eq!(&frame.jpeg_bytes()[..2], &[0xFF, 0xD8]);
    }
}

#[test]
fn infinite_duration_without_recovery_uses_fallback() {
    let mut video = ScriptedVideo::new(f64::INFINITY);
    let sequence = FrameSampler::new(quick_options()).sample_with_handle(&mut video, 1);

    let metadata = sequence.metadata();
    assert_eq!(metadata.duration_seconds, 30.0);
    assert_eq!(metadata.duration_source, DurationSource::Fallback);

    let expected = default_plan(30);
    let actual: Vec<Duration> = sequence.iter().map(|frame| frame.timestamp()).collect();
    assert_eq!(actual, expected);
}

#[test]
fn infinite_duration_recovered_by_probe() {
    let mut video = ScriptedVideo::new(f64::INFINITY);
    video.duration_after_seek = 6.5;
    let sequence = FrameSampler::new(quick_options()).sample_with_handle(&mut video, 1);

    assert_eq!(sequence.metadata().duration_seconds, 6.5);
    assert_eq!(sequence.metadata().duration_source, DurationSource::Probed);
    assert!(sequence.iter().all(|frame| frame.timestamp_seconds() < 6.5));
}

#[test]
fn persistent_blanks_are_dropped_and_renumbered() {
    let plan = default_plan(12);
    let mut video = ScriptedVideo::new(12.0);
    video.blank_at = vec![plan[0], plan[4], plan[7]];

    let sequence = FrameSampler::new(quick_options()).sample_with_handle(&mut video, 1);

    assert_eq!(sequence.len(), 7);
    assert_eq!(sequence.metadata().skipped_timestamps, 3);
    let indices: Vec<u32> = sequence.iter().map(|frame| frame.index()).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5, 6, 7]);
    assert!(
        sequence
            .frames()
            .windows(2)
            .all(|pair| pair[0].timestamp() < pair[1].timestamp())
    );
}

// ── Retry and degradation ──────────────────────────────────────────

#[test]
fn warm_up_blank_is_recovered_by_retry() {
    let plan = default_plan(12);
    let mut video = ScriptedVideo::new(12.0);
    video.warm_up_at = vec![plan[3]];

    let sequence = FrameSampler::new(quick_options()).sample_with_handle(&mut video, 1);
    assert_eq!(sequence.len(), 10);
    assert_eq!(video.renders, 11);
}

#[test]
fn blank_frames_never_reach_the_output() {
    let mut video = ScriptedVideo::new(4.0);
    video.blank_at = plan_timestamps(Duration::from_secs(4), 10, framegrab::DEFAULT_END_MARGIN);

    let sequence = FrameSampler::new(quick_options()).sample_with_handle(&mut video, 1);
    assert!(sequence.is_empty());
    assert_eq!(sequence.metadata().skipped_timestamps, 10);
    // One capture plus one retry per timestamp.
    assert_eq!(video.renders, 20);
}

#[test]
fn unavailable_capture_skips_without_retry() {
    let mut video = ScriptedVideo::new(4.0);
    video.no_render = true;

    let sequence = FrameSampler::new(quick_options()).sample_with_handle(&mut video, 1);
    assert!(sequence.is_empty());
    assert_eq!(video.renders, 10);
}

#[test]
fn timed_out_seeks_still_capture() {
    let mut video = ScriptedVideo::new(4.0);
    video.slow_seeks = true;

    let sequence = FrameSampler::new(quick_options()).sample_with_handle(&mut video, 1);
    assert_eq!(sequence.len(), 10);
}

#[test]
fn zero_dimensions_fall_back_to_default_raster() {
    let mut video = ScriptedVideo::new(4.0);
    video.dimensions = (0, 0);

    let sequence = FrameSampler::new(quick_options().with_frame_count(2)).sample_with_handle(&mut video, 1);
    assert_eq!(sequence.len(), 2);
    assert!(sequence.iter().all(|frame| (frame.width(), frame.height()) == (640, 360)));
    assert_eq!(
        (sequence.metadata().pixel_width, sequence.metadata().pixel_height),
        (640, 360)
    );
}

// ── Progress ───────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingProgress {
    snapshots: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.snapshots
            .lock()
            .expect("progress lock poisoned")
            .push(info.clone());
    }
}

#[test]
fn progress_reported_per_timestamp() {
    let plan = default_plan(12);
    let mut video = ScriptedVideo::new(12.0);
    video.blank_at = vec![plan[1]];

    let progress = Arc::new(RecordingProgress::default());
    let options = quick_options().with_progress(progress.clone());
    let sequence = FrameSampler::new(options).sample_with_handle(&mut video, 1);
    assert_eq!(sequence.len(), 9);

    let snapshots = progress.snapshots.lock().expect("progress lock poisoned");
    assert_eq!(snapshots.len(), 11);
    assert!(snapshots.iter().all(|info| info.total == 10));
    assert_eq!(snapshots[0].current_timestamp, Some(Duration::ZERO));
    assert_eq!(snapshots[1].frames_kept, 1);
    assert_eq!(snapshots[9].current, 10);
    assert_eq!(snapshots[10].frames_kept, 9);
    assert!(snapshots[10].current_timestamp.is_none());
}
