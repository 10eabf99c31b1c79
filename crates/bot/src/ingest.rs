//! Mapping from transport updates to ingress events.

use relaypack_core::gateway::IncomingMessage;
use relaypack_core::ingress::{IngressEvent, Item, ItemContent};
use relaypack_core::TelegramConfig;

/// Whether the submitter is on the allow list. An empty list allows anyone.
pub fn is_allowed(config: &TelegramConfig, message: &IncomingMessage) -> bool {
    if config.allowed_user_ids.is_empty() {
        return true;
    }
    message
        .from
        .as_ref()
        .map(|user| config.allowed_user_ids.contains(&user.id))
        .unwrap_or(false)
}

/// Maps an incoming message to an ingress event. Messages without relayable
/// content are ignored.
pub fn to_event(message: IncomingMessage) -> Option<IngressEvent> {
    let content = if let Some(sizes) = &message.photo {
        // The platform reports multiple sizes; the last is the largest.
        let file_id = sizes.last()?.file_id.clone();
        ItemContent::Photo { file_id }
    } else if let Some(video) = &message.video {
        ItemContent::Video {
            file_id: video.file_id.clone(),
        }
    } else if let Some(document) = &message.document {
        ItemContent::Document {
            file_id: document.file_id.clone(),
            file_name: document.file_name.clone(),
            mime_type: document.mime_type.clone(),
        }
    } else if let Some(sticker) = &message.sticker {
        ItemContent::Sticker {
            file_id: sticker.file_id.clone(),
        }
    } else if let Some(text) = &message.text {
        ItemContent::Text(text.clone())
    } else {
        return None;
    };

    Some(IngressEvent {
        album_id: message.media_group_id.clone(),
        item: Item {
            sequence: message.message_id,
            source_chat: message.chat.id,
            content,
            caption: message.caption,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(json: &str) -> IncomingMessage {
        serde_json::from_str(json).unwrap()
    }

    fn config(allowed: Vec<i64>) -> TelegramConfig {
        let mut config: TelegramConfig =
            serde_json::from_str(r#"{"bot_token": "t", "target_chat_id": -1}"#).unwrap();
        config.allowed_user_ids = allowed;
        config
    }

    #[test]
    fn test_album_photo_maps_to_grouped_event() {
        let event = to_event(message(
            r#"{
                "message_id": 10,
                "chat": {"id": 7},
                "media_group_id": "g-1",
                "caption": "hi",
                "photo": [{"file_id": "small"}, {"file_id": "large"}]
            }"#,
        ))
        .unwrap();

        assert_eq!(event.album_id.as_deref(), Some("g-1"));
        assert_eq!(event.item.sequence, 10);
        assert_eq!(event.item.caption.as_deref(), Some("hi"));
        match event.item.content {
            ItemContent::Photo { file_id } => assert_eq!(file_id, "large"),
            other => panic!("Expected photo, got {:?}", other),
        }
    }

    #[test]
    fn test_solo_video_has_no_album() {
        let event = to_event(message(
            r#"{
                "message_id": 11,
                "chat": {"id": 7},
                "video": {"file_id": "v"}
            }"#,
        ))
        .unwrap();

        assert!(event.album_id.is_none());
        assert!(matches!(event.item.content, ItemContent::Video { .. }));
    }

    #[test]
    fn test_video_document_keeps_metadata() {
        let event = to_event(message(
            r#"{
                "message_id": 12,
                "chat": {"id": 7},
                "document": {"file_id": "d", "file_name": "clip.mp4", "mime_type": "video/mp4"}
            }"#,
        ))
        .unwrap();

        match event.item.content {
            ItemContent::Document {
                file_name,
                mime_type,
                ..
            } => {
                assert_eq!(file_name.as_deref(), Some("clip.mp4"));
                assert_eq!(mime_type.as_deref(), Some("video/mp4"));
            }
            other => panic!("Expected document, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_message_ignored() {
        assert!(to_event(message(r#"{"message_id": 13, "chat": {"id": 7}}"#)).is_none());
    }

    #[test]
    fn test_allow_list() {
        let msg = message(
            r#"{"message_id": 14, "from": {"id": 42}, "chat": {"id": 7}, "text": "x"}"#,
        );
        assert!(is_allowed(&config(vec![]), &msg));
        assert!(is_allowed(&config(vec![42]), &msg));
        assert!(!is_allowed(&config(vec![43]), &msg));

        let anonymous = message(r#"{"message_id": 15, "chat": {"id": 7}, "text": "x"}"#);
        assert!(!is_allowed(&config(vec![42]), &anonymous));
    }
}
