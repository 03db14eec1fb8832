//! Inspection report model.
//!
//! An inspection records two videos of the same piece of equipment, one with
//! it open and one closed. [`InspectionReport`] summarises both sampling
//! runs together with who did the inspection, in the shape the archive layer
//! stores as `report.json`. Building the archive itself is left to the
//! caller; [`InspectionReport::archive_file_name`] only names it.
//!
//! # Example
//!
//! ```no_run
//! use framegrab::{CaptureStage, FrameSampler, InspectionReport};
//!
//! let sampler = FrameSampler::default();
//! let open = sampler.sample_bytes(std::fs::read("open.webm")?)?;
//! let closed = sampler.sample_bytes(std::fs::read("closed.webm")?)?;
//!
//! let report = InspectionReport::new("Ana Souza", "SN-0042", "CT-2024-17")
//!     .with_stage(CaptureStage::Open, &open)
//!     .with_stage(CaptureStage::Closed, &closed);
//! std::fs::write("report.json", report.to_json()?)?;
//! println!("{}", report.archive_file_name());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::frame::FrameSequence;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Which of the two inspection videos a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStage {
    /// Equipment recorded with its enclosure open.
    Open,
    /// Equipment recorded with its enclosure closed.
    Closed,
}

impl CaptureStage {
    /// Lower-case name, also used as the stage's output directory.
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureStage::Open => "open",
            CaptureStage::Closed => "closed",
        }
    }
}

/// Per-video summary shown in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoAnalysis {
    /// Effective duration, whole seconds (truncated).
    pub duration_seconds: u64,
    /// Number of frames kept.
    pub frame_count: usize,
    /// Decoded resolution as `"{width}x{height}"`.
    pub resolution: String,
    /// Size of the recording as `"{:.2} MB"`.
    pub file_size: String,
}

impl VideoAnalysis {
    /// Summarise one sampling run.
    pub fn from_sequence(sequence: &FrameSequence) -> Self {
        let metadata = sequence.metadata();
        Self {
            duration_seconds: metadata.duration_seconds.max(0.0).floor() as u64,
            frame_count: sequence.len(),
            resolution: format!("{}x{}", metadata.pixel_width, metadata.pixel_height),
            file_size: format!("{:.2} MB", metadata.byte_size as f64 / BYTES_PER_MEGABYTE),
        }
    }

    /// Duration as `"{minutes}m {seconds}s"`.
    pub fn duration_label(&self) -> String {
        format!("{}m {}s", self.duration_seconds / 60, self.duration_seconds % 60)
    }
}

/// Summary of a complete inspection.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionReport {
    /// Name of the technician who recorded the videos.
    pub technician: String,
    /// Equipment serial number.
    pub serial_number: String,
    /// Service contract reference.
    pub contract: String,
    /// Analysis per recorded stage.
    pub stages: BTreeMap<CaptureStage, VideoAnalysis>,
    /// When the report was generated (RFC 3339 in JSON).
    pub generated_at: DateTime<Utc>,
    /// Total frames kept across all stages.
    pub frames: usize,
}

impl InspectionReport {
    /// Start a report with no stages, stamped with the current time.
    pub fn new(
        technician: impl Into<String>,
        serial_number: impl Into<String>,
        contract: impl Into<String>,
    ) -> Self {
        Self {
            technician: technician.into(),
            serial_number: serial_number.into(),
            contract: contract.into(),
            stages: BTreeMap::new(),
            generated_at: Utc::now(),
            frames: 0,
        }
    }

    /// Add (or replace) the analysis of one stage.
    #[must_use]
    pub fn with_stage(mut self, stage: CaptureStage, sequence: &FrameSequence) -> Self {
        self.stages.insert(stage, VideoAnalysis::from_sequence(sequence));
        self.frames = self.stages.values().map(|analysis| analysis.frame_count).sum();
        self
    }

    /// Override the generation time.
    #[must_use]
    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Name for the archive holding this report:
    /// `inspection_report_{serial}_{YYYY-MM-DD}.zip`.
    ///
    /// Characters of the serial number other than ASCII letters, digits,
    /// `-` and `_` are replaced by `_`.
    pub fn archive_file_name(&self) -> String {
        let serial: String = self
            .serial_number
            .trim()
            .chars()
            .map(|character| {
                if character.is_ascii_alphanumeric() || character == '-' || character == '_' {
                    character
                } else {
                    '_'
                }
            })
            .collect();
        let serial = if serial.is_empty() { "unknown".to_string() } else { serial };
        format!(
            "inspection_report_{serial}_{}.zip",
            self.generated_at.format("%Y-%m-%d")
        )
    }
}
