//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of the external boundaries,
//! allowing comprehensive pipeline testing without a live platform or a
//! real encoder.

mod mock_gateway;
mod mock_transcoder;

pub use mock_gateway::{MockGateway, RecordedSend};
pub use mock_transcoder::{MockTranscoder, RecordedShrink};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::ingress::{ChatId, IngressEvent, Item, ItemContent};

    /// Create a photo item with reasonable defaults.
    pub fn photo_item(sequence: i64, source_chat: ChatId) -> Item {
        Item {
            sequence,
            source_chat,
            content: ItemContent::Photo {
                file_id: format!("photo-{}", sequence),
            },
            caption: None,
        }
    }

    /// Create a video item.
    pub fn video_item(sequence: i64, source_chat: ChatId) -> Item {
        Item {
            sequence,
            source_chat,
            content: ItemContent::Video {
                file_id: format!("video-{}", sequence),
            },
            caption: None,
        }
    }

    /// Create a document item carrying a video payload.
    pub fn video_document_item(sequence: i64, source_chat: ChatId) -> Item {
        Item {
            sequence,
            source_chat,
            content: ItemContent::Document {
                file_id: format!("doc-{}", sequence),
                file_name: Some(format!("clip-{}.mp4", sequence)),
                mime_type: Some("video/mp4".to_string()),
            },
            caption: None,
        }
    }

    /// Create a text item.
    pub fn text_item(sequence: i64, source_chat: ChatId, text: &str) -> Item {
        Item {
            sequence,
            source_chat,
            content: ItemContent::Text(text.to_string()),
            caption: None,
        }
    }

    /// Wrap an item into an ingress event, grouped under `album_id` when
    /// present.
    pub fn event(album_id: Option<&str>, item: Item) -> IngressEvent {
        IngressEvent {
            album_id: album_id.map(str::to_string),
            item,
        }
    }
}
