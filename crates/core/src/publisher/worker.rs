//! Dispatch queue consumer: drives one task at a time through the two-phase
//! publish pipeline.

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::gateway::{GatewayError, MediaGateway};
use crate::ingress::{ChatId, Item};
use crate::metrics;
use crate::transcoder::Transcoder;
use crate::workdir;

use super::config::PublisherConfig;
use super::preparer::Preparer;
use super::relay::Relay;
use super::types::{chunk_media, PackOutcome, PublishTask};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Workdir error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No items survived preparation and relay")]
    EmptyPack,
}

/// Single consumer of the dispatch queue.
///
/// Tasks are processed strictly one at a time, so packs reach the target
/// channel in release order. Task failures are logged and absorbed; the
/// consumer itself only stops on queue closure or shutdown.
pub struct Publisher<G, T> {
    gateway: Arc<G>,
    preparer: Preparer<G, T>,
    relay: Relay<G>,
    config: PublisherConfig,
    target_chat: ChatId,
}

impl<G, T> Publisher<G, T>
where
    G: MediaGateway + 'static,
    T: Transcoder + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        transcoder: Arc<T>,
        config: PublisherConfig,
        target_size_bytes: u64,
        target_chat: ChatId,
    ) -> Self {
        let preparer = Preparer::new(
            gateway.clone(),
            transcoder,
            config.clone(),
            target_size_bytes,
        );
        let relay = Relay::new(gateway.clone(), config.clone());
        Self {
            gateway,
            preparer,
            relay,
            config,
            target_chat,
        }
    }

    /// Consumes tasks until the queue closes or shutdown is signalled.
    pub async fn run(
        &self,
        mut queue: mpsc::UnboundedReceiver<PublishTask>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!(target_chat = self.target_chat, "Publisher started");
        loop {
            tokio::select! {
                task = queue.recv() => {
                    match task {
                        Some(task) => self.handle_task(task).await,
                        None => {
                            info!("Dispatch queue closed, publisher stopping");
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutdown signal received, publisher stopping");
                    break;
                }
            }
        }
    }

    /// Handles one task, absorbing all errors.
    pub async fn handle_task(&self, task: PublishTask) {
        match task {
            PublishTask::Text { text } => {
                if let Err(e) = self.gateway.send_text(self.target_chat, &text).await {
                    error!(error = %e, "Text publish failed");
                }
            }
            PublishTask::Sticker { file_id } => {
                if let Err(e) = self.gateway.send_sticker(self.target_chat, &file_id).await {
                    error!(error = %e, "Sticker publish failed");
                }
            }
            PublishTask::MediaPack { items } => match self.publish_pack(&items).await {
                Ok(outcome) => {
                    info!(
                        pack_id = outcome.pack_id,
                        published = outcome.published,
                        dropped = outcome.dropped,
                        publish_calls = outcome.publish_calls,
                        duration_ms = outcome.duration.as_millis() as u64,
                        "Pack published"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Pack publish failed");
                    metrics::PACKS_COMPLETED.with_label_values(&["failed"]).inc();
                }
            },
        }
    }

    /// Runs one media pack through prepare, relay and grouped publish.
    async fn publish_pack(&self, items: &[Item]) -> Result<PackOutcome, PublishError> {
        let started = Instant::now();
        let source_chat = items.first().map(|i| i.source_chat).unwrap_or_default();

        // Status message keeps the submitter informed while the pack works
        // its way through the pipeline.
        let status = self
            .gateway
            .send_text(source_chat, &format!("Processing {} item(s)...", items.len()))
            .await
            .ok();

        let pack_dir = workdir::create_pack_dir(&self.config.work_dir).await?;
        let pack_id = pack_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        debug!(pack_id = pack_id, items = items.len(), "Pack started");

        let prepared = self.preparer.prepare_all(items, &pack_dir).await;
        let relayed = self.relay.relay_all(source_chat, &prepared).await;

        if relayed.is_empty() {
            if let Some(status) = &status {
                let _ = self
                    .gateway
                    .edit_text(
                        source_chat,
                        status.message_id,
                        "Failed: no items could be processed.",
                    )
                    .await;
            }
            workdir::purge_pack_dir(&pack_dir).await;
            return Err(PublishError::EmptyPack);
        }

        let chunks = chunk_media(&relayed, self.config.max_group_size);
        let mut publish_calls = 0usize;
        let mut publish_error = None;
        for chunk in &chunks {
            match self.publish_chunk(chunk).await {
                Ok(()) => publish_calls += 1,
                Err(e) => {
                    publish_error = Some(e);
                    break;
                }
            }
        }

        // The working directory never outlives its pack, publish failure
        // included.
        if let Some(e) = publish_error {
            if let Some(status) = &status {
                let _ = self
                    .gateway
                    .edit_text(
                        source_chat,
                        status.message_id,
                        "Failed: could not publish to the channel.",
                    )
                    .await;
            }
            workdir::purge_pack_dir(&pack_dir).await;
            return Err(e);
        }

        // The relay copies served their purpose; their deletion must not
        // delay the next task.
        let relay_ids: Vec<i64> = relayed.iter().map(|r| r.message_id).collect();
        let gateway = self.gateway.clone();
        tokio::spawn(async move {
            if let Err(e) = gateway.delete_messages(source_chat, &relay_ids).await {
                warn!(error = %e, "Relay message cleanup failed");
            }
        });

        let duration = started.elapsed();
        if let Some(status) = &status {
            let _ = self
                .gateway
                .edit_text(
                    source_chat,
                    status.message_id,
                    &format!(
                        "Published {} of {} item(s) in {:.1}s.",
                        relayed.len(),
                        items.len(),
                        duration.as_secs_f64()
                    ),
                )
                .await;
        }

        workdir::purge_pack_dir(&pack_dir).await;

        metrics::PACKS_COMPLETED
            .with_label_values(&["published"])
            .inc();
        metrics::PACK_DURATION.observe(duration.as_secs_f64());

        Ok(PackOutcome {
            pack_id,
            published: relayed.len(),
            dropped: items.len() - relayed.len(),
            publish_calls,
            duration,
        })
    }

    /// Emits one grouped publish call, retrying on rate limits.
    async fn publish_chunk(
        &self,
        chunk: &[crate::gateway::InputMedia],
    ) -> Result<(), PublishError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.gateway.send_media_group(self.target_chat, chunk).await {
                Ok(_) => {
                    metrics::PUBLISH_CALLS.inc();
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempt < self.config.relay_attempts => {
                    let wait = match e.retry_after() {
                        Some(mandated) => mandated + self.config.rate_limit_margin(),
                        None => self.config.fetch_backoff(),
                    };
                    warn!(attempt = attempt, wait = ?wait, error = %e, "Grouped publish failed, retrying");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingress::ItemContent;
    use crate::testing::{MockGateway, MockTranscoder};

    fn publisher(
        gateway: Arc<MockGateway>,
        work_dir: std::path::PathBuf,
    ) -> Publisher<MockGateway, MockTranscoder> {
        let config = PublisherConfig {
            work_dir,
            relay_pause_ms: 0,
            fetch_backoff_ms: 1,
            rate_limit_margin_ms: 1,
            ..Default::default()
        };
        Publisher::new(
            gateway,
            Arc::new(MockTranscoder::new()),
            config,
            12 * 1024 * 1024,
            999,
        )
    }

    fn photo(sequence: i64) -> Item {
        Item {
            sequence,
            source_chat: 7,
            content: ItemContent::Photo {
                file_id: format!("photo-{}", sequence),
            },
            caption: None,
        }
    }

    #[tokio::test]
    async fn test_pack_publishes_to_target() {
        let gateway = Arc::new(MockGateway::new());
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(gateway.clone(), dir.path().to_path_buf());

        let items: Vec<Item> = (1..=3).map(photo).collect();
        let outcome = p.publish_pack(&items).await.unwrap();

        assert_eq!(outcome.published, 3);
        assert_eq!(outcome.dropped, 0);
        assert_eq!(outcome.publish_calls, 1);

        let groups = gateway.media_groups_sent().await;
        assert_eq!(groups.len(), 1);
        let (chat, media) = &groups[0];
        assert_eq!(*chat, 999);
        assert_eq!(media.len(), 3);
    }

    #[tokio::test]
    async fn test_large_pack_splits_into_ordered_chunks() {
        let gateway = Arc::new(MockGateway::new());
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(gateway.clone(), dir.path().to_path_buf());

        let items: Vec<Item> = (1..=23).map(photo).collect();
        let outcome = p.publish_pack(&items).await.unwrap();

        assert_eq!(outcome.publish_calls, 3);
        let groups = gateway.media_groups_sent().await;
        assert_eq!(groups[0].1.len(), 10);
        assert_eq!(groups[1].1.len(), 10);
        assert_eq!(groups[2].1.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_pack_reports_failure_and_cleans_up() {
        let gateway = Arc::new(MockGateway::new());
        gateway.fail_sends(1000).await;
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(gateway.clone(), dir.path().to_path_buf());

        let items = vec![photo(1)];
        let err = p.publish_pack(&items).await.unwrap_err();
        assert!(matches!(err, PublishError::EmptyPack));

        // The pack's working directory was removed.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_worker_survives_task_failure() {
        let gateway = Arc::new(MockGateway::new());
        gateway.fail_sends(1000).await;
        let dir = tempfile::tempdir().unwrap();
        let p = Arc::new(publisher(gateway.clone(), dir.path().to_path_buf()));

        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = broadcast::channel(1);
        let handle = {
            let p = p.clone();
            let shutdown = shutdown_tx.subscribe();
            tokio::spawn(async move { p.run(rx, shutdown).await })
        };

        tx.send(PublishTask::Text {
            text: "hello".to_string(),
        })
        .unwrap();
        drop(tx);

        // The failing send is absorbed and the worker exits cleanly on
        // queue closure.
        handle.await.unwrap();
    }
}
