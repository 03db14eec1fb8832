//! Error types for the `framegrab` crate.
//!
//! This module defines [`FramegrabError`], the unified error type returned by
//! the fallible entry points of the crate. Only structurally invalid input
//! surfaces here: an empty buffer, a buffer FFmpeg cannot open, or a file
//! without a video stream. Everything that can go wrong *while* sampling
//! (slow seeks, blank captures, unknown duration) is absorbed by the sampler
//! and reflected in the returned [`FrameSequence`](crate::FrameSequence)
//! instead.

use std::io::Error as IoError;

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framegrab` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramegrabError {
    /// The video buffer was empty.
    #[error("Video buffer is empty")]
    EmptyInput,

    /// The video buffer could not be opened as a media container.
    #[error("Failed to open video buffer ({byte_size} bytes): {reason}")]
    SourceOpen {
        /// Size of the buffer that was passed in.
        byte_size: u64,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The container does not hold a video stream.
    #[error("No video stream found in buffer")]
    NoVideoStream,

    /// The source's temporary backing file was already released.
    #[error("Video source has already been released")]
    SourceReleased,

    /// A decoded frame could not be rendered into a raster buffer.
    #[error("Failed to capture frame: {0}")]
    CaptureUnavailable(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while staging the buffer or writing output.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The background sampling task failed to complete.
    #[cfg(feature = "async")]
    #[error("Background sampling task failed: {0}")]
    BackgroundTask(String),
}

impl From<FfmpegError> for FramegrabError {
    fn from(error: FfmpegError) -> Self {
        FramegrabError::FfmpegError(error.to_string())
    }
}
