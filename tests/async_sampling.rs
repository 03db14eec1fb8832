//! Async sampling tests (feature `async`).

#![cfg(feature = "async")]

use std::path::Path;

use framegrab::{FrameSampler, FramegrabError, SamplerOptions};

#[tokio::test]
async fn empty_buffer_fails_asynchronously() {
    let result = FrameSampler::default().sample_async(Vec::new()).await;
    assert!(matches!(result, Err(FramegrabError::EmptyInput)));
}

#[tokio::test]
async fn async_matches_blocking_frame_count() {
    let path = "tests/fixtures/sample_video.mp4";
    if !Path::new(path).exists() {
        return;
    }

    let bytes = std::fs::read(path).expect("Failed to read test video");
    let sampler = FrameSampler::new(SamplerOptions::new().with_frame_count(4));

    let blocking = sampler.sample_bytes(bytes.clone()).expect("Blocking sampling failed");
    let asynchronous = sampler.sample_async(bytes).await.expect("Async sampling failed");

    assert_eq!(blocking.len(), asynchronous.len());
    assert_eq!(
        blocking.metadata().duration_seconds,
        asynchronous.metadata().duration_seconds
    );
}
