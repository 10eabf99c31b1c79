//! Types for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Information about a media file, as probed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaProbe {
    /// File path.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Container format (e.g., "mp4", "matroska").
    pub format: String,
    /// Video codec (if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    /// Video width (if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_width: Option<u32>,
    /// Video height (if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_height: Option<u32>,
    /// Whether an audio stream is present.
    pub has_audio: bool,
}

/// How the output was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeStrategy {
    /// Input already fit the budget; audio stripped, video stream copied.
    StreamCopy,
    /// Hardware-accelerated encode.
    Hardware,
    /// Software encode fallback.
    Software,
}

/// Result of a successful transcode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeOutcome {
    /// Output file path.
    pub output_path: PathBuf,
    /// Output file size in bytes.
    pub output_size_bytes: u64,
    /// Strategy that produced the output.
    pub strategy: TranscodeStrategy,
    /// Encode duration in milliseconds.
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_serialization() {
        let json = serde_json::to_string(&TranscodeStrategy::StreamCopy).unwrap();
        assert_eq!(json, "\"stream_copy\"");
        let json = serde_json::to_string(&TranscodeStrategy::Hardware).unwrap();
        assert_eq!(json, "\"hardware\"");
    }
}
