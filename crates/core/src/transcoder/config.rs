//! Configuration for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Output size budget in bytes.
    #[serde(default = "default_target_size")]
    pub target_size_bytes: u64,

    /// Resolution ceiling for the long edge, aspect ratio preserved.
    #[serde(default = "default_max_long_edge")]
    pub max_long_edge: u32,

    /// Hardware encoder tried first; `None` goes straight to software.
    #[serde(default = "default_hardware_encoder")]
    pub hardware_encoder: Option<String>,

    /// Thread count for the software fallback, kept low so concurrent
    /// encodes can coexist.
    #[serde(default = "default_software_threads")]
    pub software_threads: u32,

    /// Timeout for a single encode in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_target_size() -> u64 {
    12 * 1024 * 1024
}

fn default_max_long_edge() -> u32 {
    1920
}

fn default_hardware_encoder() -> Option<String> {
    Some("h264_nvenc".to_string())
}

fn default_software_threads() -> u32 {
    2
}

fn default_timeout() -> u64 {
    600
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            target_size_bytes: default_target_size(),
            max_long_edge: default_max_long_edge(),
            hardware_encoder: default_hardware_encoder(),
            software_threads: default_software_threads(),
            timeout_secs: default_timeout(),
        }
    }
}
