//! Async sampling.
//!
//! [`SampleFuture`] runs the same sequential pipeline as
//! [`FrameSampler::sample_bytes`] on a `tokio::task::spawn_blocking` thread,
//! so the seek/readiness/retry waits never stall the async runtime.
//!
//! # Example
//!
//! ```no_run
//! use framegrab::{FrameSampler, FramegrabError};
//!
//! # async fn example() -> Result<(), FramegrabError> {
//! let bytes = std::fs::read("open.webm")?;
//! let sequence = FrameSampler::default().sample_async(bytes).await?;
//! println!("{} frames", sequence.len());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::error::FramegrabError;
use crate::frame::FrameSequence;
use crate::sampler::FrameSampler;

/// A future that resolves to the frames sampled from a video buffer.
///
/// Created by [`FrameSampler::sample_async`]. Dropping it does not stop the
/// background run; the result is discarded once it finishes.
pub struct SampleFuture {
    handle: JoinHandle<Result<FrameSequence, FramegrabError>>,
}

impl Future for SampleFuture {
    type Output = Result<FrameSequence, FramegrabError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|result| {
            result.unwrap_or_else(|error| Err(FramegrabError::BackgroundTask(error.to_string())))
        })
    }
}

impl FrameSampler {
    /// Sample `bytes` on a blocking worker thread.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn sample_async(&self, bytes: Vec<u8>) -> SampleFuture {
        let sampler = self.clone();
        let handle = tokio::task::spawn_blocking(move || sampler.sample_bytes(bytes));
        SampleFuture { handle }
    }
}
