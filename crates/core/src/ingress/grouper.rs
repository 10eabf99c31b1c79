//! In-flight group storage.

use std::collections::HashMap;

use super::types::{GroupKey, Item};

/// Collects incoming items into ordered per-group lists.
///
/// Items within a group are kept sorted by sequence number so that
/// out-of-order delivery from the transport never leaks into release order.
/// A group is only ever observed as a whole, via a consuming [`take`].
///
/// [`take`]: Grouper::take
#[derive(Debug, Default)]
pub struct Grouper {
    groups: HashMap<GroupKey, Vec<Item>>,
}

impl Grouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item to its group, creating the group on first sight.
    pub fn add(&mut self, key: GroupKey, item: Item) {
        let items = self.groups.entry(key).or_default();
        items.push(item);
        items.sort_by_key(|i| i.sequence);
    }

    /// Atomically removes and returns the group's item list.
    ///
    /// Returns an empty list if the group does not exist; a second call for
    /// the same key therefore always returns empty.
    pub fn take(&mut self, key: &GroupKey) -> Vec<Item> {
        self.groups.remove(key).unwrap_or_default()
    }

    /// Number of live groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingress::ItemContent;

    fn photo(sequence: i64) -> Item {
        Item {
            sequence,
            source_chat: 1,
            content: ItemContent::Photo {
                file_id: format!("f{}", sequence),
            },
            caption: None,
        }
    }

    #[test]
    fn test_add_keeps_sequence_order() {
        let mut grouper = Grouper::new();
        let key = GroupKey::Album("a".to_string());
        grouper.add(key.clone(), photo(3));
        grouper.add(key.clone(), photo(1));
        grouper.add(key.clone(), photo(2));

        let items = grouper.take(&key);
        let sequences: Vec<_> = items.iter().map(|i| i.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn test_take_is_consuming() {
        let mut grouper = Grouper::new();
        let key = GroupKey::Solo(5);
        grouper.add(key.clone(), photo(5));

        assert_eq!(grouper.take(&key).len(), 1);
        assert!(grouper.take(&key).is_empty());
        assert!(grouper.is_empty());
    }

    #[test]
    fn test_take_absent_group_returns_empty() {
        let mut grouper = Grouper::new();
        assert!(grouper.take(&GroupKey::Solo(99)).is_empty());
    }

    #[test]
    fn test_groups_are_independent() {
        let mut grouper = Grouper::new();
        grouper.add(GroupKey::Album("a".to_string()), photo(1));
        grouper.add(GroupKey::Album("b".to_string()), photo(2));
        assert_eq!(grouper.len(), 2);

        grouper.take(&GroupKey::Album("a".to_string()));
        assert_eq!(grouper.len(), 1);
    }
}
