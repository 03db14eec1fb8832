//! Internal conversion helpers.
//!
//! Raster packing and timestamp arithmetic for the FFmpeg decode handle.

use std::time::Duration;

use ffmpeg_next::Rational;
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_sys_next::{AV_NOPTS_VALUE, AV_TIME_BASE};

/// Pack the RGB24 plane of `frame` into `width * height * 3` bytes.
///
/// FFmpeg pads each row to its own alignment, so rows are copied one at a
/// time unless the stride already matches.
pub fn packed_rgb(frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let row_bytes = width as usize * 3;
    let rows = height as usize;
    let plane = frame.data(0);
    match frame.stride(0) {
        stride if stride == row_bytes => plane[..row_bytes * rows].to_vec(),
        stride => plane
            .chunks(stride)
            .take(rows)
            .flat_map(|row| &row[..row_bytes])
            .copied()
            .collect(),
    }
}

/// Convert a [`Duration`] to a container-level seek timestamp.
///
/// Container-level seeks take positions in `AV_TIME_BASE` units.
pub fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    let micros = duration.as_micros();
    let per_second = AV_TIME_BASE as u128;
    (micros * per_second / 1_000_000).min(i64::MAX as u128) as i64
}

/// Convert a container-level duration (in `AV_TIME_BASE` units) to seconds.
///
/// Returns `NaN` when the container does not know its duration, which is
/// how FFmpeg reports live-style WebM recordings.
pub fn container_duration_to_seconds(duration: i64) -> f64 {
    if duration == AV_NOPTS_VALUE || duration <= 0 {
        return f64::NAN;
    }
    duration as f64 / AV_TIME_BASE as f64
}

/// Seconds represented by `pts` in `time_base` units.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a stream-level duration to seconds, or `NaN` if unknown.
pub fn stream_duration_to_seconds(duration: i64, time_base: Rational) -> f64 {
    if duration == AV_NOPTS_VALUE || duration <= 0 {
        return f64::NAN;
    }
    pts_to_seconds(duration, time_base)
}
