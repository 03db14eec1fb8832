//! Sample timestamp planning.
//!
//! Spreads `count` sample points evenly over `[0, duration)`. The first point
//! is always zero; the last sits a small margin before the end, because
//! seeking to the very end of a recording tends to produce an end-of-stream
//! black frame.

use std::time::Duration;

/// Plan `count` ascending sample timestamps across `duration`.
///
/// For `count > 1` the points are `i / (count - 1) * duration`, clamped to
/// `[0, duration - end_margin]`. A single sample is taken at zero, and a
/// count of zero yields an empty plan.
///
/// When `duration` is not longer than `end_margin` every point collapses to
/// zero; the plan still has `count` entries.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use framegrab::plan_timestamps;
///
/// let plan = plan_timestamps(Duration::from_secs(12), 4, Duration::from_millis(50));
/// assert_eq!(plan[0], Duration::ZERO);
/// assert_eq!(plan[1], Duration::from_secs(4));
/// assert_eq!(plan[3], Duration::from_millis(11_950));
/// ```
pub fn plan_timestamps(duration: Duration, count: usize, end_margin: Duration) -> Vec<Duration> {
    match count {
        0 => Vec::new(),
        1 => vec![Duration::ZERO],
        _ => {
            let last = duration.saturating_sub(end_margin);
            let span = duration.as_secs_f64();
            let steps = (count - 1) as f64;
            (0..count)
                .map(|index| {
                    let seconds = index as f64 * span / steps;
                    Duration::from_secs_f64(seconds).min(last)
                })
                .collect()
        }
    }
}
