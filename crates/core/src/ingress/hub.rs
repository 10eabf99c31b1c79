//! Shared ownership of the grouper and tracker.

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::grouper::Grouper;
use super::tracker::{GroupMeta, Tracker};
use super::types::{GroupKey, IngressEvent, Item};

/// Owns the group and metadata maps behind a single lock.
///
/// The transport writes via [`add`], the sequencer reads via [`snapshot`]
/// and removes via [`take`]. One lock keeps an item append and its metadata
/// update atomic, and keeps group release (items + metadata) atomic, even on
/// a multithreaded runtime.
///
/// [`add`]: IngressHub::add
/// [`snapshot`]: IngressHub::snapshot
/// [`take`]: IngressHub::take
#[derive(Debug, Default)]
pub struct IngressHub {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    grouper: Grouper,
    tracker: Tracker,
}

impl IngressHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an incoming item to its group and records its arrival.
    pub async fn add(&self, event: IngressEvent) {
        let key = event.group_key();
        let sequence = event.item.sequence;
        let now = Instant::now();

        let mut inner = self.inner.lock().await;
        inner.grouper.add(key.clone(), event.item);
        inner.tracker.record(key, sequence, now);
    }

    /// All live groups with their arrival metadata.
    pub async fn snapshot(&self) -> Vec<(GroupKey, GroupMeta)> {
        self.inner.lock().await.tracker.snapshot()
    }

    /// Atomically pops a group's items and drops its metadata.
    pub async fn take(&self, key: &GroupKey) -> Vec<Item> {
        let mut inner = self.inner.lock().await;
        inner.tracker.remove(key);
        inner.grouper.take(key)
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.grouper.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingress::ItemContent;

    fn event(album: Option<&str>, sequence: i64) -> IngressEvent {
        IngressEvent {
            album_id: album.map(str::to_string),
            item: Item {
                sequence,
                source_chat: 1,
                content: ItemContent::Photo {
                    file_id: format!("f{}", sequence),
                },
                caption: None,
            },
        }
    }

    #[tokio::test]
    async fn test_add_then_take() {
        let hub = IngressHub::new();
        hub.add(event(Some("a"), 2)).await;
        hub.add(event(Some("a"), 1)).await;

        let key = GroupKey::Album("a".to_string());
        let items = hub.take(&key).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].sequence, 1);

        // Both maps are cleared together.
        assert!(hub.take(&key).await.is_empty());
        assert!(hub.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_reflects_live_groups() {
        let hub = IngressHub::new();
        hub.add(event(None, 10)).await;
        hub.add(event(Some("a"), 20)).await;

        let snapshot = hub.snapshot().await;
        assert_eq!(snapshot.len(), 2);
    }
}
