//! Effective-duration resolution.
//!
//! Recordings made by browsers and phones frequently carry no usable
//! duration: the container says `NaN`, infinity, or nothing at all. The
//! sampler still needs a strictly positive, finite span to plan timestamps
//! over, so [`resolve_duration`] tries three things in order:
//!
//! 1. the duration the handle reports;
//! 2. a recovery probe: seek to a far (but sane) position so the decoder
//!    walks to the end of the stream, then ask again;
//! 3. a fixed fallback from [`SamplerOptions`].
//!
//! The fallback is lossy on purpose. Nothing here ever fails.

use std::time::{Duration, Instant};

use crate::config::SamplerOptions;
use crate::decoder::{DecodeHandle, SeekOutcome};
use crate::metadata::DurationSource;

/// An effective duration and where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedDuration {
    /// Strictly positive, finite duration.
    pub duration: Duration,
    /// Which step produced it.
    pub source: DurationSource,
}

/// Convert a reported duration into a usable one, if it is finite and positive.
pub fn usable_duration(seconds: f64) -> Option<Duration> {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).ok()
    } else {
        None
    }
}

/// Resolve the effective duration of whatever `handle` is decoding.
///
/// Calling this twice on a handle that already reports a valid duration
/// returns the same value both times and never seeks.
pub fn resolve_duration<H: DecodeHandle + ?Sized>(
    handle: &mut H,
    options: &SamplerOptions,
) -> ResolvedDuration {
    let reported = handle.reported_duration();
    if let Some(duration) = usable_duration(reported) {
        return ResolvedDuration {
            duration,
            source: DurationSource::Reported,
        };
    }

    log::debug!(
        "Reported duration {reported} is unusable; probing at {:?}",
        options.probe_position
    );

    let deadline = Instant::now() + options.seek_timeout;
    if handle.seek(options.probe_position, deadline) == SeekOutcome::TimedOut {
        log::debug!("Duration probe did not settle within {:?}", options.seek_timeout);
    }

    let probed = handle.reported_duration();
    if let Some(duration) = usable_duration(probed) {
        log::info!("Recovered duration {:.3}s via probe seek", duration.as_secs_f64());
        return ResolvedDuration {
            duration,
            source: DurationSource::Probed,
        };
    }

    log::warn!(
        "Duration unresolvable (reported {reported}, probed {probed}); assuming {:?}",
        options.fallback_duration
    );
    ResolvedDuration {
        duration: options.fallback_duration,
        source: DurationSource::Fallback,
    }
}
