//! Transcoder module: target-output-size video shrinking.
//!
//! The pipeline never re-encodes for its own sake. It only shrinks video
//! documents that exceed the publish size budget. Inputs already within the
//! budget take a fast path that strips audio and stream-copies the video.
//! Larger inputs are encoded at a bitrate derived from the budget and the
//! input duration, hardware first with a software fallback.

mod config;
mod error;
mod ffmpeg;
mod types;

use async_trait::async_trait;
use std::path::Path;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use types::{MediaProbe, TranscodeOutcome, TranscodeStrategy};

/// A transcoder that can shrink video files to a size budget.
///
/// Implementations must return a result at this boundary; the preparer
/// converts failures into the copy-original fallback, never the other way
/// around.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Probes a media file.
    async fn probe(&self, path: &Path) -> Result<MediaProbe, TranscodeError>;

    /// Produces an audio-stripped output at `output` that fits
    /// `target_bytes`, or the best-effort encode if the budget cannot be
    /// met exactly.
    async fn shrink_to_fit(
        &self,
        input: &Path,
        output: &Path,
        target_bytes: u64,
    ) -> Result<TranscodeOutcome, TranscodeError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscodeError>;
}

