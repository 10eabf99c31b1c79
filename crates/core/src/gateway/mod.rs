//! Gateway module: the destination platform boundary.
//!
//! The pipeline talks to the messaging platform exclusively through the
//! [`MediaGateway`] trait; [`TelegramGateway`] implements it over the
//! Telegram Bot API. Retry and backoff policy lives in the pipeline stages,
//! not here; the gateway surfaces rate-limit signals as
//! [`GatewayError::RateLimited`] and lets the caller decide.

mod error;
mod telegram;
mod traits;
mod types;

pub use error::GatewayError;
pub use telegram::{
    IncomingChat, IncomingDocument, IncomingFile, IncomingMessage, IncomingUser, TelegramGateway,
    Update,
};
pub use traits::MediaGateway;
pub use types::{InputMedia, MediaKind, MediaPayload, SentMessage};
