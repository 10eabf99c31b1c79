//! Types for the ingress module.

use std::fmt;

/// Platform chat identifier.
pub type ChatId = i64;

/// Identifies a group of items submitted together.
///
/// Album submissions share a platform-assigned album id; everything else
/// gets a synthetic singleton key derived from the message id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Platform-level album (media group).
    Album(String),
    /// Synthetic singleton group for an ungrouped submission.
    Solo(i64),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Album(id) => write!(f, "album:{}", id),
            Self::Solo(id) => write!(f, "solo:{}", id),
        }
    }
}

/// Content payload of a submitted item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemContent {
    /// Plain text message.
    Text(String),
    /// Sticker, addressed by its platform file id.
    Sticker { file_id: String },
    /// Photo already hosted on the platform.
    Photo { file_id: String },
    /// Video already hosted on the platform.
    Video { file_id: String },
    /// Arbitrary file attachment.
    Document {
        file_id: String,
        file_name: Option<String>,
        mime_type: Option<String>,
    },
}

impl ItemContent {
    /// Whether this content is natively addressable as gallery media
    /// (no local download round-trip needed).
    pub fn is_gallery(&self) -> bool {
        matches!(self, Self::Photo { .. } | Self::Video { .. })
    }

    /// Whether this is a document carrying video content.
    pub fn is_video_document(&self) -> bool {
        match self {
            Self::Document { mime_type, .. } => mime_type
                .as_deref()
                .is_some_and(|m| m.starts_with("video/") || m.contains("video")),
            _ => false,
        }
    }
}

/// One unit of user-submitted content. Immutable after ingress.
#[derive(Debug, Clone)]
pub struct Item {
    /// Monotonic arrival order, platform-assigned (message id).
    pub sequence: i64,
    /// Chat the item was submitted from.
    pub source_chat: ChatId,
    /// Content payload.
    pub content: ItemContent,
    /// Optional caption.
    pub caption: Option<String>,
}

/// Raw ingress event handed to the pipeline by the transport layer.
///
/// Inputs are well-formed by construction; the transport already rejects
/// unauthorized and malformed submissions.
#[derive(Debug, Clone)]
pub struct IngressEvent {
    /// Album id if the item is part of a multi-item submission.
    pub album_id: Option<String>,
    /// The submitted item.
    pub item: Item,
}

impl IngressEvent {
    /// Resolves the group key for this event.
    pub fn group_key(&self) -> GroupKey {
        match &self.album_id {
            Some(id) => GroupKey::Album(id.clone()),
            None => GroupKey::Solo(self.item.sequence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sequence: i64, content: ItemContent) -> Item {
        Item {
            sequence,
            source_chat: 42,
            content,
            caption: None,
        }
    }

    #[test]
    fn test_group_key_from_album() {
        let event = IngressEvent {
            album_id: Some("a-1".to_string()),
            item: item(10, ItemContent::Text("hi".to_string())),
        };
        assert_eq!(event.group_key(), GroupKey::Album("a-1".to_string()));
    }

    #[test]
    fn test_group_key_solo_uses_sequence() {
        let event = IngressEvent {
            album_id: None,
            item: item(10, ItemContent::Text("hi".to_string())),
        };
        assert_eq!(event.group_key(), GroupKey::Solo(10));
    }

    #[test]
    fn test_is_gallery() {
        assert!(ItemContent::Photo {
            file_id: "p".to_string()
        }
        .is_gallery());
        assert!(ItemContent::Video {
            file_id: "v".to_string()
        }
        .is_gallery());
        assert!(!ItemContent::Text("t".to_string()).is_gallery());
        assert!(!ItemContent::Document {
            file_id: "d".to_string(),
            file_name: None,
            mime_type: None,
        }
        .is_gallery());
    }

    #[test]
    fn test_is_video_document() {
        let video_doc = ItemContent::Document {
            file_id: "d".to_string(),
            file_name: Some("clip.mp4".to_string()),
            mime_type: Some("video/mp4".to_string()),
        };
        assert!(video_doc.is_video_document());

        let pdf = ItemContent::Document {
            file_id: "d".to_string(),
            file_name: Some("doc.pdf".to_string()),
            mime_type: Some("application/pdf".to_string()),
        };
        assert!(!pdf.is_video_document());

        let untagged = ItemContent::Document {
            file_id: "d".to_string(),
            file_name: None,
            mime_type: None,
        };
        assert!(!untagged.is_video_document());

        assert!(!ItemContent::Video {
            file_id: "v".to_string()
        }
        .is_video_document());
    }

    #[test]
    fn test_group_key_display() {
        assert_eq!(GroupKey::Album("x".to_string()).to_string(), "album:x");
        assert_eq!(GroupKey::Solo(7).to_string(), "solo:7");
    }
}
