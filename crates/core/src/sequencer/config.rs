//! Configuration for the sequencer module.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencerConfig {
    /// Interval between release passes in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Quiet time a group must accumulate before it is considered settled,
    /// in milliseconds.
    #[serde(default = "default_settle_threshold_ms")]
    pub settle_threshold_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_settle_threshold_ms() -> u64 {
    3000
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            settle_threshold_ms: default_settle_threshold_ms(),
        }
    }
}

impl SequencerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn settle_threshold(&self) -> Duration {
        Duration::from_millis(self.settle_threshold_ms)
    }
}
