//! Trait definition for the destination platform boundary.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::ingress::ChatId;

use super::error::GatewayError;
use super::types::{InputMedia, MediaPayload, SentMessage};

/// The destination platform surface the pipeline consumes.
///
/// Send calls return the created message id together with the stable file
/// reference the platform minted for the transmitted content. All calls are
/// fallible; retry policy lives in the calling stage, not here.
#[async_trait]
pub trait MediaGateway: Send + Sync {
    /// Returns the name of this gateway implementation.
    fn name(&self) -> &str;

    /// Downloads the content behind `file_id` into `dest_dir`.
    async fn fetch(&self, file_id: &str, dest_dir: &Path) -> Result<PathBuf, GatewayError>;

    /// Sends a plain text message.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<SentMessage, GatewayError>;

    /// Edits a previously sent text message. Used for status reporting.
    async fn edit_text(
        &self,
        chat: ChatId,
        message_id: i64,
        text: &str,
    ) -> Result<(), GatewayError>;

    /// Sends a sticker by file id.
    async fn send_sticker(&self, chat: ChatId, file_id: &str)
        -> Result<SentMessage, GatewayError>;

    /// Sends a single photo, minting a stable photo file id.
    async fn send_photo(
        &self,
        chat: ChatId,
        payload: MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, GatewayError>;

    /// Sends a single video, minting a stable video file id.
    async fn send_video(
        &self,
        chat: ChatId,
        payload: MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, GatewayError>;

    /// Sends a single document, minting a stable document file id.
    async fn send_document(
        &self,
        chat: ChatId,
        payload: MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, GatewayError>;

    /// Publishes an ordered media group. `media` must not exceed the
    /// platform's maximum items per group (10).
    async fn send_media_group(
        &self,
        chat: ChatId,
        media: &[InputMedia],
    ) -> Result<Vec<i64>, GatewayError>;

    /// Deletes messages, best-effort.
    async fn delete_messages(&self, chat: ChatId, message_ids: &[i64])
        -> Result<(), GatewayError>;
}
