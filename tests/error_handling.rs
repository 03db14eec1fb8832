//! Error handling integration tests.
//!
//! Only structurally invalid input is an error; these check that each case
//! surfaces as the right variant with a useful message.

use std::path::Path;

use framegrab::{FrameSampler, FramegrabError, VideoSource};

#[test]
fn empty_buffer() {
    let result = FrameSampler::default().sample_bytes(Vec::new());
    assert!(matches!(result, Err(FramegrabError::EmptyInput)));
}

#[test]
fn undecodable_buffer() {
    let result = VideoSource::from_bytes(b"this is not a media file".to_vec());
    let error = result.expect_err("garbage should not open");
    assert!(
        matches!(error, FramegrabError::SourceOpen { byte_size: 24, .. } | FramegrabError::NoVideoStream),
        "unexpected error: {error:?}"
    );
}

#[test]
fn undecodable_buffer_message() {
    let error = FrameSampler::default()
        .sample_bytes(vec![0x42; 4096])
        .expect_err("constant bytes should not open");
    let message = error.to_string();
    assert!(
        message.contains("Failed to open video buffer") || message.contains("No video stream"),
        "Error message should describe the open failure: {message}"
    );
}

#[test]
fn missing_file() {
    let result = VideoSource::from_path("this_file_does_not_exist.webm");
    assert!(matches!(result, Err(FramegrabError::IoError(_))));
}

#[test]
fn released_source_cannot_be_sampled() {
    let path = "tests/fixtures/sample_video.mp4";
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::from_path(path).expect("Failed to open test video");
    source.release();
    source.release();
    assert!(source.is_released());
    assert!(matches!(
        FrameSampler::default().sample(&source),
        Err(FramegrabError::SourceReleased)
    ));
    assert!(!source.bytes().is_empty());
}
