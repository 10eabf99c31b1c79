//! Mock gateway for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::gateway::{GatewayError, InputMedia, MediaGateway, MediaPayload, SentMessage};
use crate::ingress::ChatId;

/// A recorded individual send for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub chat: ChatId,
    /// "text", "sticker", "photo", "video" or "document".
    pub kind: String,
    /// Local path for uploads, file id for remote references, text body
    /// for text messages.
    pub payload: String,
    pub caption: Option<String>,
    pub message_id: i64,
}

/// Mock implementation of the MediaGateway trait.
///
/// Provides controllable behavior for testing:
/// - Track every send, edit and deletion for assertions
/// - Inject fetch and send failures, including rate limits
/// - Mint incrementing message ids and deterministic file ids
#[derive(Debug)]
pub struct MockGateway {
    sends: Arc<RwLock<Vec<RecordedSend>>>,
    media_groups: Arc<RwLock<Vec<(ChatId, Vec<InputMedia>)>>>,
    edits: Arc<RwLock<Vec<(ChatId, i64, String)>>>,
    deletions: Arc<RwLock<Vec<(ChatId, Vec<i64>)>>>,
    fetches: Arc<RwLock<u32>>,
    /// Remaining fetch calls that will fail.
    fetch_failures: Arc<RwLock<u32>>,
    /// Remaining fetch calls that will fail with a rate limit, and the
    /// mandated wait.
    fetch_rate_limits: Arc<RwLock<(u32, Duration)>>,
    /// Remaining send calls that will fail.
    send_failures: Arc<RwLock<u32>>,
    /// Remaining grouped publish calls that will fail.
    media_group_failures: Arc<RwLock<u32>>,
    /// Remaining send calls that will fail with a rate limit, and the
    /// mandated wait.
    rate_limits: Arc<RwLock<(u32, Duration)>>,
    next_message_id: Arc<RwLock<i64>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            sends: Arc::new(RwLock::new(Vec::new())),
            media_groups: Arc::new(RwLock::new(Vec::new())),
            edits: Arc::new(RwLock::new(Vec::new())),
            deletions: Arc::new(RwLock::new(Vec::new())),
            fetches: Arc::new(RwLock::new(0)),
            fetch_failures: Arc::new(RwLock::new(0)),
            fetch_rate_limits: Arc::new(RwLock::new((0, Duration::ZERO))),
            send_failures: Arc::new(RwLock::new(0)),
            media_group_failures: Arc::new(RwLock::new(0)),
            rate_limits: Arc::new(RwLock::new((0, Duration::ZERO))),
            next_message_id: Arc::new(RwLock::new(0)),
        }
    }

    /// Make the next `count` fetch calls fail.
    pub async fn fail_fetches(&self, count: u32) {
        *self.fetch_failures.write().await = count;
    }

    /// Make the next `count` fetch calls fail with a rate limit.
    pub async fn rate_limit_fetches(&self, count: u32, retry_after: Duration) {
        *self.fetch_rate_limits.write().await = (count, retry_after);
    }

    /// Make the next `count` individual send calls fail.
    pub async fn fail_sends(&self, count: u32) {
        *self.send_failures.write().await = count;
    }

    /// Make the next `count` grouped publish calls fail.
    pub async fn fail_media_groups(&self, count: u32) {
        *self.media_group_failures.write().await = count;
    }

    /// Make the next `count` individual send calls fail with a rate limit.
    pub async fn rate_limit_sends(&self, count: u32, retry_after: Duration) {
        *self.rate_limits.write().await = (count, retry_after);
    }

    /// Number of fetch calls seen, failed ones included.
    pub async fn fetch_count(&self) -> u32 {
        *self.fetches.read().await
    }

    /// All successful individual sends, in order.
    pub async fn recorded_sends(&self) -> Vec<RecordedSend> {
        self.sends.read().await.clone()
    }

    /// All grouped publish calls, in order.
    pub async fn media_groups_sent(&self) -> Vec<(ChatId, Vec<InputMedia>)> {
        self.media_groups.read().await.clone()
    }

    /// All status message edits, in order.
    pub async fn recorded_edits(&self) -> Vec<(ChatId, i64, String)> {
        self.edits.read().await.clone()
    }

    /// All deletion calls, in order.
    pub async fn recorded_deletions(&self) -> Vec<(ChatId, Vec<i64>)> {
        self.deletions.read().await.clone()
    }

    async fn mint_message_id(&self) -> i64 {
        let mut next = self.next_message_id.write().await;
        *next += 1;
        *next
    }

    /// Pops one pending send failure, if any.
    async fn take_send_failure(&self) -> Option<GatewayError> {
        {
            let mut limits = self.rate_limits.write().await;
            if limits.0 > 0 {
                limits.0 -= 1;
                return Some(GatewayError::RateLimited {
                    retry_after: limits.1,
                });
            }
        }
        let mut failures = self.send_failures.write().await;
        if *failures > 0 {
            *failures -= 1;
            return Some(GatewayError::api("mock send failure"));
        }
        None
    }

    async fn record_send(
        &self,
        chat: ChatId,
        kind: &str,
        payload: &MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, GatewayError> {
        if let Some(err) = self.take_send_failure().await {
            return Err(err);
        }
        let message_id = self.mint_message_id().await;
        let payload_str = match payload {
            MediaPayload::FileId(id) => id.clone(),
            MediaPayload::Local(path) => path.display().to_string(),
        };
        self.sends.write().await.push(RecordedSend {
            chat,
            kind: kind.to_string(),
            payload: payload_str,
            caption: caption.map(str::to_string),
            message_id,
        });
        Ok(SentMessage {
            message_id,
            file_id: format!("stable-{}-{}", kind, message_id),
        })
    }
}

#[async_trait]
impl MediaGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, file_id: &str, dest_dir: &Path) -> Result<PathBuf, GatewayError> {
        *self.fetches.write().await += 1;
        {
            let mut limits = self.fetch_rate_limits.write().await;
            if limits.0 > 0 {
                limits.0 -= 1;
                return Err(GatewayError::RateLimited {
                    retry_after: limits.1,
                });
            }
        }
        {
            let mut failures = self.fetch_failures.write().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(GatewayError::api("mock fetch failure"));
            }
        }
        let path = dest_dir.join(format!("{}.bin", file_id));
        tokio::fs::write(&path, b"mock content").await?;
        Ok(path)
    }

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<SentMessage, GatewayError> {
        if let Some(err) = self.take_send_failure().await {
            return Err(err);
        }
        let message_id = self.mint_message_id().await;
        self.sends.write().await.push(RecordedSend {
            chat,
            kind: "text".to_string(),
            payload: text.to_string(),
            caption: None,
            message_id,
        });
        Ok(SentMessage {
            message_id,
            file_id: String::new(),
        })
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message_id: i64,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.edits
            .write()
            .await
            .push((chat, message_id, text.to_string()));
        Ok(())
    }

    async fn send_sticker(
        &self,
        chat: ChatId,
        file_id: &str,
    ) -> Result<SentMessage, GatewayError> {
        self.record_send(chat, "sticker", &MediaPayload::FileId(file_id.to_string()), None)
            .await
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        payload: MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, GatewayError> {
        self.record_send(chat, "photo", &payload, caption).await
    }

    async fn send_video(
        &self,
        chat: ChatId,
        payload: MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, GatewayError> {
        self.record_send(chat, "video", &payload, caption).await
    }

    async fn send_document(
        &self,
        chat: ChatId,
        payload: MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, GatewayError> {
        self.record_send(chat, "document", &payload, caption).await
    }

    async fn send_media_group(
        &self,
        chat: ChatId,
        media: &[InputMedia],
    ) -> Result<Vec<i64>, GatewayError> {
        {
            let mut failures = self.media_group_failures.write().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(GatewayError::api("mock media group failure"));
            }
        }
        if let Some(err) = self.take_send_failure().await {
            return Err(err);
        }
        self.media_groups
            .write()
            .await
            .push((chat, media.to_vec()));
        let mut ids = Vec::with_capacity(media.len());
        for _ in media {
            ids.push(self.mint_message_id().await);
        }
        Ok(ids)
    }

    async fn delete_messages(
        &self,
        chat: ChatId,
        message_ids: &[i64],
    ) -> Result<(), GatewayError> {
        self.deletions
            .write()
            .await
            .push((chat, message_ids.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_message_ids_increment() {
        let gateway = MockGateway::new();
        let a = gateway.send_text(1, "a").await.unwrap();
        let b = gateway.send_text(1, "b").await.unwrap();
        assert!(b.message_id > a.message_id);
    }

    #[tokio::test]
    async fn test_fetch_failure_injection() {
        let gateway = MockGateway::new();
        gateway.fail_fetches(1).await;

        let dir = tempfile::tempdir().unwrap();
        assert!(gateway.fetch("f", dir.path()).await.is_err());
        let path = gateway.fetch("f", dir.path()).await.unwrap();
        assert!(path.exists());
        assert_eq!(gateway.fetch_count().await, 2);
    }

    #[tokio::test]
    async fn test_rate_limit_injection() {
        let gateway = MockGateway::new();
        gateway
            .rate_limit_sends(1, Duration::from_secs(7))
            .await;

        let err = gateway
            .send_photo(1, MediaPayload::FileId("f".to_string()), None)
            .await
            .unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }
}
