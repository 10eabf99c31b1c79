use serde::{Deserialize, Serialize};

use crate::publisher::PublisherConfig;
use crate::sequencer::SequencerConfig;
use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub sequencer: SequencerConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
}

/// Telegram transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot API token
    pub bot_token: String,
    /// Channel the pipeline publishes into
    pub target_chat_id: i64,
    /// Users allowed to submit; empty means anyone
    #[serde(default)]
    pub allowed_user_ids: Vec<i64>,
    /// Bot API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Request timeout in seconds. Uploads can be large, keep this generous.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Long poll timeout in seconds
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_poll_timeout_secs() -> u64 {
    30
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub telegram: SanitizedTelegramConfig,
    pub sequencer: SequencerConfig,
    pub publisher: PublisherConfig,
    pub transcoder: TranscoderConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub bot_token: String,
    pub target_chat_id: i64,
    pub allowed_user_ids: Vec<i64>,
    pub api_base: String,
    pub timeout_secs: u64,
    pub poll_timeout_secs: u64,
}

impl Config {
    pub fn sanitized(&self) -> SanitizedConfig {
        SanitizedConfig {
            telegram: SanitizedTelegramConfig {
                bot_token: "***".to_string(),
                target_chat_id: self.telegram.target_chat_id,
                allowed_user_ids: self.telegram.allowed_user_ids.clone(),
                api_base: self.telegram.api_base.clone(),
                timeout_secs: self.telegram.timeout_secs,
                poll_timeout_secs: self.telegram.poll_timeout_secs,
            },
            sequencer: self.sequencer.clone(),
            publisher: self.publisher.clone(),
            transcoder: self.transcoder.clone(),
        }
    }
}
