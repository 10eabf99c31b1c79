//! Item preparation: fetch, transcode, stage.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::gateway::MediaGateway;
use crate::ingress::{Item, ItemContent};
use crate::metrics;
use crate::transcoder::Transcoder;

use super::config::PublisherConfig;
use super::types::{GalleryKind, PreparedItem};

/// Per-item preparation stage.
///
/// Gallery items pass through untouched; document items are fetched into
/// the pack's working directory and, when they carry video content, shrunk
/// to the publish size budget under a bounded transcode concurrency. Every
/// failure is isolated to its item; preparation never fails a pack.
pub struct Preparer<G, T> {
    gateway: Arc<G>,
    transcoder: Arc<T>,
    transcode_permits: Arc<Semaphore>,
    config: PublisherConfig,
    target_size_bytes: u64,
}

impl<G: MediaGateway, T: Transcoder> Preparer<G, T> {
    pub fn new(
        gateway: Arc<G>,
        transcoder: Arc<T>,
        config: PublisherConfig,
        target_size_bytes: u64,
    ) -> Self {
        let transcode_permits = Arc::new(Semaphore::new(config.max_parallel_transcodes.max(1)));
        Self {
            gateway,
            transcoder,
            transcode_permits,
            config,
            target_size_bytes,
        }
    }

    /// Prepares all items of a pack concurrently, preserving item order in
    /// the returned list. Failed items are dropped.
    pub async fn prepare_all(&self, items: &[Item], pack_dir: &Path) -> Vec<PreparedItem> {
        let results = join_all(items.iter().map(|item| self.prepare_item(item, pack_dir))).await;
        results.into_iter().flatten().collect()
    }

    /// Prepares one item, returning `None` when the item is dropped.
    async fn prepare_item(&self, item: &Item, pack_dir: &Path) -> Option<PreparedItem> {
        match &item.content {
            // Gallery short-circuit: already addressable on the platform.
            ItemContent::Photo { file_id } => Some(PreparedItem::Gallery {
                media: GalleryKind::Photo,
                file_id: file_id.clone(),
                caption: item.caption.clone(),
            }),
            ItemContent::Video { file_id } => Some(PreparedItem::Gallery {
                media: GalleryKind::Video,
                file_id: file_id.clone(),
                caption: item.caption.clone(),
            }),
            ItemContent::Document {
                file_id, file_name, ..
            } => {
                self.prepare_document(item, file_id, file_name.as_deref(), pack_dir)
                    .await
            }
            // Text and stickers cannot appear inside a media pack; the
            // sequencer routes them to their own tasks.
            ItemContent::Text(_) | ItemContent::Sticker { .. } => {
                warn!(sequence = item.sequence, "Non-media item in pack, dropping");
                metrics::ITEMS_DROPPED.with_label_values(&["prepare"]).inc();
                None
            }
        }
    }

    async fn prepare_document(
        &self,
        item: &Item,
        file_id: &str,
        file_name: Option<&str>,
        pack_dir: &Path,
    ) -> Option<PreparedItem> {
        let fetched = self.fetch_with_retry(file_id, pack_dir).await?;

        let final_name = file_name
            .map(str::to_string)
            .or_else(|| {
                fetched
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
            })
            .unwrap_or_else(|| format!("item-{}", item.sequence));
        let staged = pack_dir.join(format!("proc_{}", final_name));

        if item.content.is_video_document() {
            // Bounded concurrency: the transcode is the expensive step.
            let _permit = self.transcode_permits.acquire().await.ok()?;
            match self
                .transcoder
                .shrink_to_fit(&fetched, &staged, self.target_size_bytes)
                .await
            {
                Ok(outcome) => {
                    metrics::TRANSCODES
                        .with_label_values(&[match outcome.strategy {
                            crate::transcoder::TranscodeStrategy::StreamCopy => "stream_copy",
                            crate::transcoder::TranscodeStrategy::Hardware => "hardware",
                            crate::transcoder::TranscodeStrategy::Software => "software",
                        }])
                        .inc();
                }
                Err(e) => {
                    // Transcode failure falls back to the original file.
                    warn!(sequence = item.sequence, error = %e, "Transcode failed, using original");
                    metrics::TRANSCODES.with_label_values(&["copy_fallback"]).inc();
                    if let Err(e) = tokio::fs::copy(&fetched, &staged).await {
                        warn!(sequence = item.sequence, error = %e, "Copy fallback failed, dropping item");
                        metrics::ITEMS_DROPPED.with_label_values(&["prepare"]).inc();
                        return None;
                    }
                }
            }
        } else if fetched != staged {
            if let Err(e) = tokio::fs::copy(&fetched, &staged).await {
                warn!(sequence = item.sequence, error = %e, "Staging copy failed, dropping item");
                metrics::ITEMS_DROPPED.with_label_values(&["prepare"]).inc();
                return None;
            }
        }

        // Rename over any stale prior output so the relay stage never sees
        // a partially written file.
        let final_path = pack_dir.join(&final_name);
        if let Err(e) = tokio::fs::rename(&staged, &final_path).await {
            warn!(sequence = item.sequence, error = %e, "Staging rename failed, dropping item");
            metrics::ITEMS_DROPPED.with_label_values(&["prepare"]).inc();
            return None;
        }

        debug!(sequence = item.sequence, path = %final_path.display(), "Item prepared");
        Some(PreparedItem::Document {
            path: final_path,
            caption: item.caption.clone(),
        })
    }

    /// Fetches with bounded attempts and rate-limit-aware backoff.
    async fn fetch_with_retry(&self, file_id: &str, dest_dir: &Path) -> Option<PathBuf> {
        for attempt in 1..=self.config.fetch_attempts {
            match self.gateway.fetch(file_id, dest_dir).await {
                Ok(path) => return Some(path),
                Err(e) => {
                    if attempt == self.config.fetch_attempts {
                        warn!(file_id = file_id, attempts = attempt, error = %e, "Fetch exhausted, dropping item");
                        break;
                    }
                    let wait = match e.retry_after() {
                        Some(mandated) => mandated + self.config.rate_limit_margin(),
                        None => self.config.fetch_backoff(),
                    };
                    debug!(file_id = file_id, attempt = attempt, wait = ?wait, "Fetch failed, retrying");
                    tokio::time::sleep(wait).await;
                }
            }
        }
        metrics::ITEMS_DROPPED.with_label_values(&["fetch"]).inc();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockGateway, MockTranscoder};

    fn preparer(
        gateway: MockGateway,
        transcoder: MockTranscoder,
    ) -> Preparer<MockGateway, MockTranscoder> {
        let config = PublisherConfig {
            fetch_backoff_ms: 1,
            rate_limit_margin_ms: 1,
            ..Default::default()
        };
        Preparer::new(
            Arc::new(gateway),
            Arc::new(transcoder),
            config,
            12 * 1024 * 1024,
        )
    }

    fn photo_item(sequence: i64) -> Item {
        Item {
            sequence,
            source_chat: 1,
            content: ItemContent::Photo {
                file_id: format!("photo-{}", sequence),
            },
            caption: Some(format!("cap-{}", sequence)),
        }
    }

    #[tokio::test]
    async fn test_gallery_items_pass_through() {
        let prep = preparer(MockGateway::new(), MockTranscoder::new());
        let dir = tempfile::tempdir().unwrap();

        let items = vec![photo_item(1), photo_item(2)];
        let prepared = prep.prepare_all(&items, dir.path()).await;

        assert_eq!(prepared.len(), 2);
        match &prepared[0] {
            PreparedItem::Gallery { media, file_id, .. } => {
                assert_eq!(*media, GalleryKind::Photo);
                assert_eq!(file_id, "photo-1");
            }
            other => panic!("Expected gallery item, got {:?}", other),
        }
        // Nothing was fetched.
        assert_eq!(prep.gateway.fetch_count().await, 0);
    }

    #[tokio::test]
    async fn test_document_is_fetched_and_staged() {
        let gateway = MockGateway::new();
        let prep = preparer(gateway, MockTranscoder::new());
        let dir = tempfile::tempdir().unwrap();

        let item = Item {
            sequence: 1,
            source_chat: 1,
            content: ItemContent::Document {
                file_id: "doc-1".to_string(),
                file_name: Some("report.pdf".to_string()),
                mime_type: Some("application/pdf".to_string()),
            },
            caption: None,
        };

        let prepared = prep.prepare_all(&[item], dir.path()).await;
        assert_eq!(prepared.len(), 1);
        match &prepared[0] {
            PreparedItem::Document { path, .. } => {
                assert_eq!(path.file_name().unwrap(), "report.pdf");
                assert!(path.exists());
            }
            other => panic!("Expected document item, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_exhaustion_drops_item() {
        let gateway = MockGateway::new();
        gateway.fail_fetches(100).await;
        let prep = preparer(gateway, MockTranscoder::new());
        let dir = tempfile::tempdir().unwrap();

        let item = Item {
            sequence: 1,
            source_chat: 1,
            content: ItemContent::Document {
                file_id: "doc-1".to_string(),
                file_name: None,
                mime_type: None,
            },
            caption: None,
        };

        let prepared = prep.prepare_all(&[item], dir.path()).await;
        assert!(prepared.is_empty());
        assert_eq!(prep.gateway.fetch_count().await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_fetch_waits_mandated_delay_plus_margin() {
        let gateway = MockGateway::new();
        gateway
            .rate_limit_fetches(1, std::time::Duration::from_secs(9))
            .await;
        let prep = preparer(gateway, MockTranscoder::new());
        let dir = tempfile::tempdir().unwrap();

        let item = Item {
            sequence: 1,
            source_chat: 1,
            content: ItemContent::Document {
                file_id: "doc-1".to_string(),
                file_name: Some("report.pdf".to_string()),
                mime_type: Some("application/pdf".to_string()),
            },
            caption: None,
        };

        let start = tokio::time::Instant::now();
        let prepared = prep.prepare_all(&[item], dir.path()).await;

        // One rate-limited attempt, then success after the mandated wait
        // plus the configured margin (1ms in this config).
        assert_eq!(prepared.len(), 1);
        assert_eq!(prep.gateway.fetch_count().await, 2);
        assert_eq!(start.elapsed(), std::time::Duration::from_millis(9001));
    }

    #[tokio::test]
    async fn test_transcode_failure_falls_back_to_copy() {
        let transcoder = MockTranscoder::new();
        transcoder.fail_next().await;
        let prep = preparer(MockGateway::new(), transcoder);
        let dir = tempfile::tempdir().unwrap();

        let item = Item {
            sequence: 1,
            source_chat: 1,
            content: ItemContent::Document {
                file_id: "vid-1".to_string(),
                file_name: Some("clip.mp4".to_string()),
                mime_type: Some("video/mp4".to_string()),
            },
            caption: None,
        };

        let prepared = prep.prepare_all(&[item], dir.path()).await;
        assert_eq!(prepared.len(), 1);
        match &prepared[0] {
            PreparedItem::Document { path, .. } => assert!(path.exists()),
            other => panic!("Expected document item, got {:?}", other),
        }
    }
}
