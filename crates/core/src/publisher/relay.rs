//! Relay sends: mint stable references one item at a time.
//!
//! Grouped publish calls only accept remote file references, so every
//! prepared item is first sent individually to the submitter's chat. The
//! platform's acknowledgement carries the stable file id the final grouped
//! publish will reuse. Relay messages are transient and deleted once the
//! pack is out.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::gateway::{MediaGateway, MediaPayload, SentMessage};
use crate::ingress::ChatId;
use crate::metrics;

use super::config::PublisherConfig;
use super::types::{PreparedItem, RelayedItem};

pub struct Relay<G> {
    gateway: Arc<G>,
    config: PublisherConfig,
}

impl<G: MediaGateway> Relay<G> {
    pub fn new(gateway: Arc<G>, config: PublisherConfig) -> Self {
        Self { gateway, config }
    }

    /// Relays prepared items strictly in order, pausing between consecutive
    /// sends. Items whose relay attempts are exhausted are dropped.
    pub async fn relay_all(&self, chat: ChatId, prepared: &[PreparedItem]) -> Vec<RelayedItem> {
        let mut relayed = Vec::with_capacity(prepared.len());
        for (index, item) in prepared.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.relay_pause()).await;
            }
            if let Some(sent) = self.relay_item(chat, item).await {
                relayed.push(sent);
            }
        }
        relayed
    }

    async fn relay_item(&self, chat: ChatId, item: &PreparedItem) -> Option<RelayedItem> {
        for attempt in 1..=self.config.relay_attempts {
            match self.send_once(chat, item).await {
                Ok(sent) => {
                    debug!(
                        message_id = sent.message_id,
                        attempt = attempt,
                        "Item relayed"
                    );
                    return Some(RelayedItem {
                        message_id: sent.message_id,
                        file_id: sent.file_id,
                        caption: item.caption().map(str::to_string),
                        media: item.media_kind(),
                    });
                }
                Err(e) => {
                    if attempt == self.config.relay_attempts {
                        warn!(attempts = attempt, error = %e, "Relay exhausted, dropping item");
                        break;
                    }
                    metrics::RELAY_RETRIES.inc();
                    let wait = match e.retry_after() {
                        Some(mandated) => mandated + self.config.rate_limit_margin(),
                        None => self.config.fetch_backoff(),
                    };
                    debug!(attempt = attempt, wait = ?wait, error = %e, "Relay failed, retrying");
                    tokio::time::sleep(wait).await;
                }
            }
        }
        metrics::ITEMS_DROPPED.with_label_values(&["relay"]).inc();
        None
    }

    async fn send_once(
        &self,
        chat: ChatId,
        item: &PreparedItem,
    ) -> Result<SentMessage, crate::gateway::GatewayError> {
        match item {
            PreparedItem::Gallery {
                media,
                file_id,
                caption,
            } => {
                let payload = MediaPayload::FileId(file_id.clone());
                match media {
                    super::types::GalleryKind::Photo => {
                        self.gateway.send_photo(chat, payload, caption.as_deref()).await
                    }
                    super::types::GalleryKind::Video => {
                        self.gateway.send_video(chat, payload, caption.as_deref()).await
                    }
                }
            }
            PreparedItem::Document { path, caption } => {
                let payload = MediaPayload::Local(path.clone());
                self.gateway
                    .send_document(chat, payload, caption.as_deref())
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MediaKind;
    use crate::testing::MockGateway;
    use super::super::types::GalleryKind;

    fn relay(gateway: MockGateway) -> Relay<MockGateway> {
        let config = PublisherConfig {
            relay_pause_ms: 0,
            fetch_backoff_ms: 1,
            rate_limit_margin_ms: 1,
            ..Default::default()
        };
        Relay::new(Arc::new(gateway), config)
    }

    fn gallery(file_id: &str) -> PreparedItem {
        PreparedItem::Gallery {
            media: GalleryKind::Photo,
            file_id: file_id.to_string(),
            caption: None,
        }
    }

    #[tokio::test]
    async fn test_relay_preserves_order() {
        let r = relay(MockGateway::new());
        let prepared = vec![gallery("a"), gallery("b"), gallery("c")];

        let relayed = r.relay_all(7, &prepared).await;
        assert_eq!(relayed.len(), 3);
        assert!(relayed[0].message_id < relayed[1].message_id);
        assert!(relayed[1].message_id < relayed[2].message_id);
        assert!(relayed.iter().all(|r| r.media == MediaKind::Photo));
    }

    #[tokio::test]
    async fn test_relay_retries_then_succeeds() {
        let gateway = MockGateway::new();
        gateway.fail_sends(2).await;
        let r = relay(gateway);

        let relayed = r.relay_all(7, &[gallery("a")]).await;
        assert_eq!(relayed.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_send_waits_mandated_delay_plus_margin() {
        let gateway = MockGateway::new();
        gateway
            .rate_limit_sends(1, std::time::Duration::from_secs(5))
            .await;
        let r = relay(gateway);

        let start = tokio::time::Instant::now();
        let relayed = r.relay_all(7, &[gallery("a")]).await;

        // The retry honors the mandated wait plus the configured margin
        // (1ms in this config), then succeeds.
        assert_eq!(relayed.len(), 1);
        assert_eq!(start.elapsed(), std::time::Duration::from_millis(5001));
    }

    #[tokio::test]
    async fn test_relay_exhaustion_drops_item() {
        let gateway = MockGateway::new();
        gateway.fail_sends(100).await;
        let r = relay(gateway);

        let relayed = r.relay_all(7, &[gallery("a"), gallery("b")]).await;
        // Both items exhaust their attempts independently.
        assert!(relayed.is_empty());
    }
}
