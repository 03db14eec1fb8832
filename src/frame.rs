//! Captured frames and the sequences they form.
//!
//! A [`CapturedFrame`] is one labelled, JPEG-encoded still. A
//! [`FrameSequence`] is the result of one sampling run: the frames that
//! survived capture, in timestamp order and numbered contiguously from 1,
//! plus the [`SamplingMetadata`] describing how the run went.

use std::io::Cursor;
use std::path::Path;
use std::slice::Iter;
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};

use crate::error::FramegrabError;
use crate::metadata::SamplingMetadata;

/// One labelled still image captured from a video.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct CapturedFrame {
    pub(crate) index: u32,
    pub(crate) timestamp: Duration,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) data: Vec<u8>,
}

impl CapturedFrame {
    /// Position of this frame in its sequence, starting at 1.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Nominal timestamp the frame was requested at.
    ///
    /// This is the planned sample point, not the decoder's actual position,
    /// which may differ slightly after a slow or inexact seek.
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// [`timestamp`](Self::timestamp) in fractional seconds.
    pub fn timestamp_seconds(&self) -> f64 {
        self.timestamp.as_secs_f64()
    }

    /// Raster width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raster height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded JPEG bytes.
    pub fn jpeg_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame and return its JPEG bytes.
    pub fn into_jpeg_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Write the JPEG bytes to `path` unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`FramegrabError::IoError`] if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FramegrabError> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Decode the JPEG back into an image.
    ///
    /// # Errors
    ///
    /// Returns [`FramegrabError::ImageError`] if the bytes cannot be decoded.
    pub fn to_image(&self) -> Result<DynamicImage, FramegrabError> {
        Ok(image::load_from_memory_with_format(
            &self.data,
            ImageFormat::Jpeg,
        )?)
    }
}

/// The ordered result of one sampling run.
///
/// May hold fewer frames than were requested; it is empty when every
/// capture was unavailable or blank.
#[derive(Debug, Clone)]
#[must_use]
pub struct FrameSequence {
    pub(crate) frames: Vec<CapturedFrame>,
    pub(crate) metadata: SamplingMetadata,
}

impl FrameSequence {
    /// Frames in ascending timestamp order.
    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    /// How the run resolved duration, dimensions and skips.
    pub fn metadata(&self) -> &SamplingMetadata {
        &self.metadata
    }

    /// Number of frames kept.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if no frame survived capture.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate over the frames in order.
    pub fn iter(&self) -> Iter<'_, CapturedFrame> {
        self.frames.iter()
    }

    /// Consume the sequence and return its frames.
    pub fn into_frames(self) -> Vec<CapturedFrame> {
        self.frames
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a CapturedFrame;
    type IntoIter = Iter<'a, CapturedFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Encode `image` as a baseline JPEG at `quality` (1–100).
pub(crate) fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, FramegrabError> {
    let mut cursor = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut cursor, quality.clamp(1, 100));
    image.write_with_encoder(encoder)?;
    Ok(cursor.into_inner())
}
