//! Types for the gateway module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Media kind as resolved by the destination platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
}

impl MediaKind {
    /// The Bot API `type` string for media group entries.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Document => "document",
        }
    }
}

/// Content handed to a send call: an existing platform file id or a local file.
#[derive(Debug, Clone)]
pub enum MediaPayload {
    FileId(String),
    Local(PathBuf),
}

/// A message created by a relay send, carrying the minted stable reference.
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Id of the side-channel message; deleted after publish.
    pub message_id: i64,
    /// Stable, reusable file id for the transmitted content.
    pub file_id: String,
}

/// One entry of a grouped publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputMedia {
    pub kind: MediaKind,
    pub file_id: String,
    pub caption: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_api_name() {
        assert_eq!(MediaKind::Photo.api_name(), "photo");
        assert_eq!(MediaKind::Video.api_name(), "video");
        assert_eq!(MediaKind::Document.api_name(), "document");
    }
}
