//! In-memory video sources.
//!
//! A [`VideoSource`] owns the recorded video bytes together with a temporary
//! file that mirrors them on disk, since FFmpeg demuxers read from a path.
//! That backing file is the source's only transient resource: it is removed
//! by [`VideoSource::release`] or, at the latest, when the source is
//! dropped, so every exit path cleans it up.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::decoder::{DecodeHandle, FfmpegDecoder};
use crate::error::FramegrabError;
use crate::metadata::VideoMetadata;

/// A recorded video held in memory, ready to be decoded.
///
/// # Example
///
/// ```no_run
/// use framegrab::{FrameSampler, SamplerOptions, VideoSource};
///
/// let mut source = VideoSource::from_path("closed.mp4")?;
/// println!("{} bytes, {}x{}", source.byte_size(), source.metadata().width, source.metadata().height);
///
/// let sequence = FrameSampler::new(SamplerOptions::new()).sample(&source)?;
/// source.release();
/// # Ok::<(), framegrab::FramegrabError>(())
/// ```
pub struct VideoSource {
    bytes: Vec<u8>,
    backing: Option<NamedTempFile>,
    metadata: VideoMetadata,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("byte_size", &self.bytes.len())
            .field("backing", &self.backing.as_ref().map(|file| file.path().to_path_buf()))
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl VideoSource {
    /// Take ownership of a recorded video buffer and probe it.
    ///
    /// # Errors
    ///
    /// - [`FramegrabError::EmptyInput`] if `bytes` is empty.
    /// - [`FramegrabError::SourceOpen`] if FFmpeg cannot open the buffer as a
    ///   media container.
    /// - [`FramegrabError::NoVideoStream`] if the container has no video.
    /// - [`FramegrabError::IoError`] if the backing file cannot be written.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FramegrabError> {
        if bytes.is_empty() {
            return Err(FramegrabError::EmptyInput);
        }

        let byte_size = bytes.len() as u64;
        let mut backing = tempfile::Builder::new()
            .prefix("framegrab-")
            .suffix(".video")
            .tempfile()?;
        backing.write_all(&bytes)?;
        backing.flush()?;

        log::debug!(
            "Staged {byte_size} byte video buffer at {}",
            backing.path().display()
        );

        let decoder = FfmpegDecoder::open(backing.path()).map_err(|error| match error {
            FramegrabError::NoVideoStream => FramegrabError::NoVideoStream,
            other => FramegrabError::SourceOpen {
                byte_size,
                reason: other.to_string(),
            },
        })?;

        let (width, height) = decoder.dimensions();
        let metadata = VideoMetadata {
            byte_size,
            declared_duration: decoder.reported_duration(),
            width,
            height,
            frames_per_second: decoder.frames_per_second(),
            codec: decoder.codec_name(),
            format: decoder.format_name(),
        };

        if !metadata.has_valid_duration() {
            log::info!(
                "Container declares no usable duration ({}); it will be resolved during sampling",
                metadata.declared_duration
            );
        }

        Ok(Self {
            bytes,
            backing: Some(backing),
            metadata,
        })
    }

    /// Read a video file fully into memory and probe it.
    ///
    /// # Errors
    ///
    /// Returns [`FramegrabError::IoError`] if the file cannot be read, or any
    /// error from [`from_bytes`](Self::from_bytes).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FramegrabError> {
        let path = path.as_ref();
        log::debug!("Reading video file: {}", path.display());
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Metadata probed when the source was created.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// The recorded bytes, unchanged.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the recorded buffer in bytes.
    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Returns `true` once [`release`](Self::release) has been called.
    pub fn is_released(&self) -> bool {
        self.backing.is_none()
    }

    /// Open a fresh decode handle over this source.
    ///
    /// # Errors
    ///
    /// - [`FramegrabError::SourceReleased`] if the source was released.
    /// - Any error from [`FfmpegDecoder::open`].
    pub fn open_decoder(&self) -> Result<FfmpegDecoder, FramegrabError> {
        let backing = self.backing.as_ref().ok_or(FramegrabError::SourceReleased)?;
        FfmpegDecoder::open(backing.path())
    }

    /// Remove the temporary backing file. Calling this more than once is a
    /// no-op; the in-memory bytes stay available.
    pub fn release(&mut self) {
        if let Some(backing) = self.backing.take() {
            let path = backing.path().to_path_buf();
            if let Err(error) = backing.close() {
                log::warn!("Failed to remove {}: {error}", path.display());
            } else {
                log::debug!("Released video backing file {}", path.display());
            }
        }
    }
}
