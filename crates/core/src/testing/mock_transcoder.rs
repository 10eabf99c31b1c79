//! Mock transcoder for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transcoder::{
    MediaProbe, TranscodeError, TranscodeOutcome, TranscodeStrategy, Transcoder,
};

/// A recorded shrink request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedShrink {
    pub input: PathBuf,
    pub output: PathBuf,
    pub target_bytes: u64,
    pub success: bool,
}

/// Mock implementation of the Transcoder trait.
///
/// Writes a real (tiny) output file on success so downstream staging can
/// rename it, and supports injecting failures per call.
#[derive(Debug)]
pub struct MockTranscoder {
    shrinks: Arc<RwLock<Vec<RecordedShrink>>>,
    /// Remaining shrink calls that will fail.
    failures: Arc<RwLock<u32>>,
    /// Strategy reported on success.
    strategy: Arc<RwLock<TranscodeStrategy>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self {
            shrinks: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(0)),
            strategy: Arc::new(RwLock::new(TranscodeStrategy::Software)),
        }
    }

    /// Make the next shrink call fail.
    pub async fn fail_next(&self) {
        *self.failures.write().await = 1;
    }

    /// Make the next `count` shrink calls fail.
    pub async fn fail_shrinks(&self, count: u32) {
        *self.failures.write().await = count;
    }

    /// Set the strategy reported for successful shrinks.
    pub async fn set_strategy(&self, strategy: TranscodeStrategy) {
        *self.strategy.write().await = strategy;
    }

    /// All shrink requests seen, in order.
    pub async fn recorded_shrinks(&self) -> Vec<RecordedShrink> {
        self.shrinks.read().await.clone()
    }

    pub async fn shrink_count(&self) -> usize {
        self.shrinks.read().await.len()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaProbe, TranscodeError> {
        Ok(MediaProbe {
            path: path.to_path_buf(),
            size_bytes: 20 * 1024 * 1024,
            duration_secs: 60.0,
            format: "mp4".to_string(),
            video_codec: Some("h264".to_string()),
            video_width: Some(1920),
            video_height: Some(1080),
            has_audio: true,
        })
    }

    async fn shrink_to_fit(
        &self,
        input: &Path,
        output: &Path,
        target_bytes: u64,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let fail = {
            let mut failures = self.failures.write().await;
            if *failures > 0 {
                *failures -= 1;
                true
            } else {
                false
            }
        };

        self.shrinks.write().await.push(RecordedShrink {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            target_bytes,
            success: !fail,
        });

        if fail {
            return Err(TranscodeError::encode_failed("mock failure", None));
        }

        tokio::fs::write(output, b"shrunk").await?;
        Ok(TranscodeOutcome {
            output_path: output.to_path_buf(),
            output_size_bytes: 6,
            strategy: *self.strategy.read().await,
            duration_ms: 1,
        })
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shrink_writes_output() {
        let transcoder = MockTranscoder::new();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");

        let outcome = transcoder
            .shrink_to_fit(Path::new("/in.mp4"), &output, 1024)
            .await
            .unwrap();
        assert!(outcome.output_path.exists());
        assert_eq!(transcoder.shrink_count().await, 1);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let transcoder = MockTranscoder::new();
        transcoder.fail_next().await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        assert!(transcoder
            .shrink_to_fit(Path::new("/in.mp4"), &output, 1024)
            .await
            .is_err());

        let shrinks = transcoder.recorded_shrinks().await;
        assert!(!shrinks[0].success);
    }
}
