//! Configuration for the publisher module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the publish pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Base directory for per-pack working directories.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Maximum fetch attempts per document item.
    #[serde(default = "default_fetch_attempts")]
    pub fetch_attempts: u32,

    /// Fixed backoff between fetch attempts in milliseconds.
    #[serde(default = "default_fetch_backoff_ms")]
    pub fetch_backoff_ms: u64,

    /// Margin added on top of a platform-mandated rate-limit wait, in
    /// milliseconds.
    #[serde(default = "default_rate_limit_margin_ms")]
    pub rate_limit_margin_ms: u64,

    /// Maximum relay attempts per item.
    #[serde(default = "default_relay_attempts")]
    pub relay_attempts: u32,

    /// Pause between consecutive relay sends in milliseconds.
    #[serde(default = "default_relay_pause_ms")]
    pub relay_pause_ms: u64,

    /// Maximum items per grouped publish call (platform limit: 10).
    #[serde(default = "default_max_group_size")]
    pub max_group_size: usize,

    /// Maximum simultaneous transcodes within one pack.
    #[serde(default = "default_max_parallel_transcodes")]
    pub max_parallel_transcodes: usize,
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("packs")
}

fn default_fetch_attempts() -> u32 {
    5
}

fn default_fetch_backoff_ms() -> u64 {
    1000
}

fn default_rate_limit_margin_ms() -> u64 {
    1000
}

fn default_relay_attempts() -> u32 {
    5
}

fn default_relay_pause_ms() -> u64 {
    300
}

fn default_max_group_size() -> usize {
    10
}

fn default_max_parallel_transcodes() -> usize {
    2
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            fetch_attempts: default_fetch_attempts(),
            fetch_backoff_ms: default_fetch_backoff_ms(),
            rate_limit_margin_ms: default_rate_limit_margin_ms(),
            relay_attempts: default_relay_attempts(),
            relay_pause_ms: default_relay_pause_ms(),
            max_group_size: default_max_group_size(),
            max_parallel_transcodes: default_max_parallel_transcodes(),
        }
    }
}

impl PublisherConfig {
    pub fn fetch_backoff(&self) -> Duration {
        Duration::from_millis(self.fetch_backoff_ms)
    }

    pub fn rate_limit_margin(&self) -> Duration {
        Duration::from_millis(self.rate_limit_margin_ms)
    }

    pub fn relay_pause(&self) -> Duration {
        Duration::from_millis(self.relay_pause_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PublisherConfig::default();
        assert_eq!(config.fetch_attempts, 5);
        assert_eq!(config.relay_attempts, 5);
        assert_eq!(config.max_group_size, 10);
        assert_eq!(config.max_parallel_transcodes, 2);
        assert_eq!(config.relay_pause(), Duration::from_millis(300));
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
work_dir = "/tmp/packs"
max_parallel_transcodes = 1
"#;
        let config: PublisherConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.work_dir, PathBuf::from("/tmp/packs"));
        assert_eq!(config.max_parallel_transcodes, 1);
        assert_eq!(config.max_group_size, 10);
    }
}
