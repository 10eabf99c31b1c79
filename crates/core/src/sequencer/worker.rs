//! Release ordering: oldest settled group first, one per pass.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::ingress::{GroupKey, IngressHub, Item, ItemContent};
use crate::metrics;
use crate::publisher::PublishTask;

use super::config::SequencerConfig;

/// Periodically inspects pending groups and releases them onto the
/// dispatch queue in arrival order.
///
/// A group is settled once no item has arrived for the configured
/// threshold. The oldest pending group gates the whole pass: while it is
/// still accumulating, nothing younger may overtake it. At most one group
/// is released per pass.
pub struct Sequencer {
    config: SequencerConfig,
    hub: Arc<IngressHub>,
    queue: mpsc::UnboundedSender<PublishTask>,
}

impl Sequencer {
    pub fn new(
        config: SequencerConfig,
        hub: Arc<IngressHub>,
        queue: mpsc::UnboundedSender<PublishTask>,
    ) -> Self {
        Self { config, hub, queue }
    }

    /// Runs release passes until shutdown.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            tick_ms = self.config.tick_interval_ms,
            settle_ms = self.config.settle_threshold_ms,
            "Sequencer started"
        );
        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.recv() => {
                    info!("Shutdown signal received, sequencer stopping");
                    break;
                }
            }
        }
    }

    /// One release pass. Returns the released group's key, if any.
    pub async fn tick(&self) -> Option<GroupKey> {
        let mut pending = self.hub.snapshot().await;
        if pending.is_empty() {
            return None;
        }
        pending.sort_by_key(|(_, meta)| meta.first_sequence);

        let (key, meta) = pending.into_iter().next()?;
        let quiet = Instant::now().saturating_duration_since(meta.last_arrival);
        if quiet < self.config.settle_threshold() {
            // The oldest group is still accumulating; nothing younger may
            // jump the queue.
            debug!(group = %key, quiet_ms = quiet.as_millis() as u64, "Oldest group not settled");
            return None;
        }

        let items = self.hub.take(&key).await;
        if items.is_empty() {
            return None;
        }

        let task = classify(items);
        metrics::GROUPS_RELEASED
            .with_label_values(&[task_kind(&task)])
            .inc();
        debug!(group = %key, kind = task_kind(&task), "Group released");

        if self.queue.send(task).is_err() {
            warn!(group = %key, "Dispatch queue closed, dropping group");
            return None;
        }
        Some(key)
    }
}

/// Maps a released item list onto its publish task. Lone text and sticker
/// items bypass the media pipeline entirely.
fn classify(mut items: Vec<Item>) -> PublishTask {
    if items.len() == 1 {
        match &items[0].content {
            ItemContent::Text(text) => {
                return PublishTask::Text { text: text.clone() };
            }
            ItemContent::Sticker { file_id } => {
                return PublishTask::Sticker {
                    file_id: file_id.clone(),
                };
            }
            _ => {}
        }
    }
    // Everything else becomes a media pack, including mixed groups.
    items.sort_by_key(|i| i.sequence);
    PublishTask::MediaPack { items }
}

fn task_kind(task: &PublishTask) -> &'static str {
    match task {
        PublishTask::Text { .. } => "text",
        PublishTask::Sticker { .. } => "sticker",
        PublishTask::MediaPack { .. } => "media_pack",
    }
}
