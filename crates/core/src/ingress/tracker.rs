//! Per-group arrival metadata.

use std::collections::HashMap;
use tokio::time::Instant;

use super::types::GroupKey;

/// Arrival metadata for one live group.
#[derive(Debug, Clone, Copy)]
pub struct GroupMeta {
    /// Minimum sequence number ever seen in the group.
    pub first_sequence: i64,
    /// Time of the most recent arrival.
    pub last_arrival: Instant,
}

/// Tracks `{first_sequence, last_arrival}` per live group.
///
/// `first_sequence` defines the global release order across groups and is
/// lowered if a smaller sequence arrives late (out-of-order defense).
#[derive(Debug, Default)]
pub struct Tracker {
    groups: HashMap<GroupKey, GroupMeta>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an arrival for the group.
    pub fn record(&mut self, key: GroupKey, sequence: i64, now: Instant) {
        self.groups
            .entry(key)
            .and_modify(|meta| {
                meta.last_arrival = now;
                if sequence < meta.first_sequence {
                    meta.first_sequence = sequence;
                }
            })
            .or_insert(GroupMeta {
                first_sequence: sequence,
                last_arrival: now,
            });
    }

    /// Removes the group's metadata. Called only on release.
    pub fn remove(&mut self, key: &GroupKey) -> Option<GroupMeta> {
        self.groups.remove(key)
    }

    pub fn get(&self, key: &GroupKey) -> Option<GroupMeta> {
        self.groups.get(key).copied()
    }

    /// All live groups with their metadata.
    pub fn snapshot(&self) -> Vec<(GroupKey, GroupMeta)> {
        self.groups
            .iter()
            .map(|(k, m)| (k.clone(), *m))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    #[tokio::test]
    async fn test_record_first_arrival() {
        let mut tracker = Tracker::new();
        let now = Instant::now();
        tracker.record(GroupKey::Solo(7), 7, now);

        let meta = tracker.get(&GroupKey::Solo(7)).unwrap();
        assert_eq!(meta.first_sequence, 7);
        assert_eq!(meta.last_arrival, now);
    }

    #[tokio::test]
    async fn test_record_updates_last_arrival() {
        let mut tracker = Tracker::new();
        let key = GroupKey::Album("a".to_string());
        let t0 = Instant::now();
        tracker.record(key.clone(), 5, t0);

        let t1 = t0 + Duration::from_secs(1);
        tracker.record(key.clone(), 6, t1);

        let meta = tracker.get(&key).unwrap();
        assert_eq!(meta.first_sequence, 5);
        assert_eq!(meta.last_arrival, t1);
    }

    #[tokio::test]
    async fn test_out_of_order_arrival_lowers_first_sequence() {
        let mut tracker = Tracker::new();
        let key = GroupKey::Album("a".to_string());
        let now = Instant::now();
        tracker.record(key.clone(), 5, now);
        tracker.record(key.clone(), 3, now);
        tracker.record(key.clone(), 9, now);

        assert_eq!(tracker.get(&key).unwrap().first_sequence, 3);
    }

    #[tokio::test]
    async fn test_remove() {
        let mut tracker = Tracker::new();
        let key = GroupKey::Solo(1);
        tracker.record(key.clone(), 1, Instant::now());

        assert!(tracker.remove(&key).is_some());
        assert!(tracker.remove(&key).is_none());
        assert!(tracker.is_empty());
    }
}
