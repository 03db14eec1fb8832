//! FFmpeg console verbosity.
//!
//! FFmpeg writes its own diagnostics straight to stderr, independently of
//! the `log` facade used by the rest of the crate. Browser recordings with
//! missing durations make demuxers chatty, so callers usually want to turn
//! this down before sampling.
//!
//! ```no_run
//! use framegrab::FfmpegLogLevel;
//!
//! framegrab::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use ffmpeg_next::util::log::Level;

/// How much FFmpeg prints to stderr, from silent to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Nothing.
    Quiet,
    /// Errors only.
    Error,
    /// Errors and warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Debugging output.
    Debug,
}

impl FfmpegLogLevel {
    const NAMES: [(&'static str, FfmpegLogLevel); 5] = [
        ("quiet", FfmpegLogLevel::Quiet),
        ("error", FfmpegLogLevel::Error),
        ("warning", FfmpegLogLevel::Warning),
        ("info", FfmpegLogLevel::Info),
        ("debug", FfmpegLogLevel::Debug),
    ];

    fn level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = Self::NAMES
            .iter()
            .find(|(_, level)| level == self)
            .map_or("warning", |(name, _)| name);
        f.write_str(name)
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        let value = if value == "warn" { "warning".to_string() } else { value };
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == value)
            .map(|(_, level)| *level)
            .ok_or_else(|| {
                format!("unknown FFmpeg log level '{value}' (expected quiet, error, warning, info or debug)")
            })
    }
}

/// Set FFmpeg's stderr verbosity for the whole process.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.level());
}
