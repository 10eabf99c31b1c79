pub mod config;
pub mod gateway;
pub mod ingress;
pub mod metrics;
pub mod publisher;
pub mod sequencer;
pub mod testing;
pub mod transcoder;
pub mod workdir;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    TelegramConfig,
};
pub use gateway::{GatewayError, MediaGateway, TelegramGateway};
pub use ingress::{GroupKey, IngressEvent, IngressHub, Item, ItemContent};
pub use publisher::{PublishTask, Publisher, PublisherConfig};
pub use sequencer::{Sequencer, SequencerConfig};
pub use transcoder::{FfmpegTranscoder, TranscodeError, Transcoder, TranscoderConfig};
