//! Types for the publisher module.

use std::path::PathBuf;
use std::time::Duration;

use crate::gateway::{InputMedia, MediaKind};
use crate::ingress::Item;

/// A unit of work released by the sequencer onto the dispatch queue.
#[derive(Debug, Clone)]
pub enum PublishTask {
    /// Single text message, bypasses prepare and relay.
    Text { text: String },
    /// Single sticker, bypasses prepare and relay.
    Sticker { file_id: String },
    /// One settled group's full ordered item list.
    MediaPack { items: Vec<Item> },
}

/// Gallery media subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryKind {
    Photo,
    Video,
}

impl From<GalleryKind> for MediaKind {
    fn from(kind: GalleryKind) -> Self {
        match kind {
            GalleryKind::Photo => MediaKind::Photo,
            GalleryKind::Video => MediaKind::Video,
        }
    }
}

/// Result of the preparer stage for one item.
#[derive(Debug, Clone)]
pub enum PreparedItem {
    /// Already remotely addressable; no local transfer was needed.
    Gallery {
        media: GalleryKind,
        file_id: String,
        caption: Option<String>,
    },
    /// Fetched (and possibly transcoded) into the pack's working directory.
    Document {
        path: PathBuf,
        caption: Option<String>,
    },
}

impl PreparedItem {
    pub fn caption(&self) -> Option<&str> {
        match self {
            Self::Gallery { caption, .. } | Self::Document { caption, .. } => caption.as_deref(),
        }
    }

    /// Media kind the relay send will use. Documents keep their kind.
    pub fn media_kind(&self) -> MediaKind {
        match self {
            Self::Gallery { media, .. } => (*media).into(),
            Self::Document { .. } => MediaKind::Document,
        }
    }
}

/// A prepared item after the relay send minted its stable reference.
#[derive(Debug, Clone)]
pub struct RelayedItem {
    /// Id of the transient relay message; deleted after publish.
    pub message_id: i64,
    /// Stable remote reference usable in grouped publish calls.
    pub file_id: String,
    /// Caption carried through from ingress.
    pub caption: Option<String>,
    /// Media subtype as resolved by the platform.
    pub media: MediaKind,
}

impl RelayedItem {
    pub fn to_input_media(&self) -> InputMedia {
        InputMedia {
            kind: self.media,
            file_id: self.file_id.clone(),
            caption: self.caption.clone(),
        }
    }
}

/// Partitions relayed items into ordered publish chunks of at most
/// `max_group_size` entries. Concatenating the chunks reproduces the input
/// order exactly.
pub fn chunk_media(relayed: &[RelayedItem], max_group_size: usize) -> Vec<Vec<InputMedia>> {
    relayed
        .chunks(max_group_size.max(1))
        .map(|chunk| chunk.iter().map(RelayedItem::to_input_media).collect())
        .collect()
}

/// Summary of one published pack.
#[derive(Debug, Clone)]
pub struct PackOutcome {
    /// Generated pack identifier (working directory name).
    pub pack_id: String,
    /// Items that survived prepare and relay.
    pub published: usize,
    /// Items dropped along the way.
    pub dropped: usize,
    /// Grouped publish calls emitted.
    pub publish_calls: usize,
    /// End-to-end pack duration.
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relayed(n: usize) -> Vec<RelayedItem> {
        (0..n)
            .map(|i| RelayedItem {
                message_id: i as i64,
                file_id: format!("f{}", i),
                caption: None,
                media: MediaKind::Photo,
            })
            .collect()
    }

    #[test]
    fn test_chunk_media_exact_fit() {
        let chunks = chunk_media(&relayed(10), 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 10);
    }

    #[test]
    fn test_chunk_media_splits_and_preserves_order() {
        let chunks = chunk_media(&relayed(23), 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[1].len(), 10);
        assert_eq!(chunks[2].len(), 3);

        let flat: Vec<_> = chunks
            .iter()
            .flatten()
            .map(|m| m.file_id.clone())
            .collect();
        let expected: Vec<_> = (0..23).map(|i| format!("f{}", i)).collect();
        assert_eq!(flat, expected);
    }

    #[test]
    fn test_chunk_media_empty() {
        assert!(chunk_media(&[], 10).is_empty());
    }

    #[test]
    fn test_gallery_kind_conversion() {
        assert_eq!(MediaKind::from(GalleryKind::Photo), MediaKind::Photo);
        assert_eq!(MediaKind::from(GalleryKind::Video), MediaKind::Video);
    }
}
