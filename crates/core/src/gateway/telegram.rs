//! Telegram Bot API gateway implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::config::TelegramConfig;
use crate::ingress::ChatId;

use super::error::GatewayError;
use super::traits::MediaGateway;
use super::types::{InputMedia, MediaPayload, SentMessage};

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiFilePath {
    file_path: Option<String>,
}

/// Message shape returned by send calls; only the fields needed to extract
/// the minted file reference.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiMessage {
    pub message_id: i64,
    photo: Option<Vec<ApiFile>>,
    video: Option<ApiFile>,
    document: Option<ApiFile>,
    sticker: Option<ApiFile>,
}

impl ApiMessage {
    /// The stable file id minted for this message's media, if any.
    /// For photos the platform returns multiple sizes; the last is largest.
    fn stable_file_id(&self) -> Option<String> {
        if let Some(sizes) = &self.photo {
            return sizes.last().map(|f| f.file_id.clone());
        }
        self.video
            .as_ref()
            .or(self.document.as_ref())
            .or(self.sticker.as_ref())
            .map(|f| f.file_id.clone())
    }

    fn into_sent(self, context: &str) -> Result<SentMessage, GatewayError> {
        let file_id = self
            .stable_file_id()
            .ok_or_else(|| GatewayError::MissingReference {
                context: context.to_string(),
            })?;
        Ok(SentMessage {
            message_id: self.message_id,
            file_id,
        })
    }
}

/// An update received from long polling. Exposed so the transport layer can
/// map incoming messages to ingress events.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub from: Option<IncomingUser>,
    pub chat: IncomingChat,
    pub media_group_id: Option<String>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub photo: Option<Vec<IncomingFile>>,
    pub video: Option<IncomingFile>,
    pub sticker: Option<IncomingFile>,
    pub document: Option<IncomingDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingUser {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingFile {
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingDocument {
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

/// Telegram Bot API gateway.
pub struct TelegramGateway {
    client: Client,
    config: TelegramConfig,
}

impl TelegramGateway {
    /// Creates a new gateway with the given configuration.
    pub fn new(config: TelegramConfig) -> Self {
        let client = Client::builder()
            // Long poll timeout plus slack; uploads get the same budget.
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            file_path
        )
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let body = response.text().await?;
        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&body).map_err(|e| GatewayError::ParseError {
                reason: format!("Invalid API response: {}", e),
            })?;

        if !envelope.ok {
            if let Some(retry_after) = envelope.parameters.and_then(|p| p.retry_after) {
                return Err(GatewayError::RateLimited {
                    retry_after: Duration::from_secs(retry_after),
                });
            }
            return Err(GatewayError::api(
                envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        envelope.result.ok_or_else(|| GatewayError::ParseError {
            reason: "API response missing result".to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, GatewayError> {
        debug!(method = method, "Calling Bot API");
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Sends a single media item, uploading the file when the payload is
    /// local and passing the file id through otherwise.
    async fn send_media(
        &self,
        method: &str,
        field: &str,
        chat: ChatId,
        payload: MediaPayload,
        caption: Option<&str>,
        extra: &[(&str, &str)],
    ) -> Result<ApiMessage, GatewayError> {
        match payload {
            MediaPayload::FileId(file_id) => {
                let mut body = json!({
                    "chat_id": chat,
                    "disable_notification": true,
                });
                body[field] = json!(file_id);
                if let Some(caption) = caption {
                    body["caption"] = json!(caption);
                }
                for (key, value) in extra {
                    body[*key] = json!(value);
                }
                self.call(method, body).await
            }
            MediaPayload::Local(path) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "file".to_string());
                let bytes = tokio::fs::read(&path).await?;

                let mut form = Form::new()
                    .text("chat_id", chat.to_string())
                    .text("disable_notification", "true")
                    .part(field.to_string(), Part::bytes(bytes).file_name(file_name));
                if let Some(caption) = caption {
                    form = form.text("caption", caption.to_string());
                }
                for (key, value) in extra {
                    form = form.text(key.to_string(), value.to_string());
                }

                let response = self
                    .client
                    .post(self.method_url(method))
                    .multipart(form)
                    .send()
                    .await?;
                Self::decode(response).await
            }
        }
    }

    /// Long-polls the platform for new updates. Transport-side only; not
    /// part of the pipeline-facing [`MediaGateway`] surface.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, GatewayError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": self.config.poll_timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }
}

#[async_trait]
impl MediaGateway for TelegramGateway {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn fetch(&self, file_id: &str, dest_dir: &Path) -> Result<PathBuf, GatewayError> {
        let info: ApiFilePath = self
            .call("getFile", json!({ "file_id": file_id }))
            .await?;

        let file_path = info.file_path.ok_or_else(|| GatewayError::MissingReference {
            context: format!("getFile({})", file_id),
        })?;

        let file_name = file_path
            .rsplit('/')
            .next()
            .unwrap_or(&file_path)
            .to_string();
        let dest = dest_dir.join(file_name);

        let response = self.client.get(self.file_url(&file_path)).send().await?;
        if !response.status().is_success() {
            return Err(GatewayError::api(format!(
                "File download failed with status {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(&dest, &bytes).await?;
        debug!(file_id = file_id, path = %dest.display(), "Fetched file");
        Ok(dest)
    }

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<SentMessage, GatewayError> {
        let message: ApiMessage = self
            .call("sendMessage", json!({ "chat_id": chat, "text": text }))
            .await?;
        Ok(SentMessage {
            message_id: message.message_id,
            file_id: String::new(),
        })
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message_id: i64,
        text: &str,
    ) -> Result<(), GatewayError> {
        let _: ApiMessage = self
            .call(
                "editMessageText",
                json!({ "chat_id": chat, "message_id": message_id, "text": text }),
            )
            .await?;
        Ok(())
    }

    async fn send_sticker(
        &self,
        chat: ChatId,
        file_id: &str,
    ) -> Result<SentMessage, GatewayError> {
        let message: ApiMessage = self
            .call("sendSticker", json!({ "chat_id": chat, "sticker": file_id }))
            .await?;
        message.into_sent("sendSticker")
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        payload: MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, GatewayError> {
        self.send_media("sendPhoto", "photo", chat, payload, caption, &[])
            .await?
            .into_sent("sendPhoto")
    }

    async fn send_video(
        &self,
        chat: ChatId,
        payload: MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, GatewayError> {
        self.send_media("sendVideo", "video", chat, payload, caption, &[])
            .await?
            .into_sent("sendVideo")
    }

    async fn send_document(
        &self,
        chat: ChatId,
        payload: MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, GatewayError> {
        self.send_media(
            "sendDocument",
            "document",
            chat,
            payload,
            caption,
            &[("disable_content_type_detection", "true")],
        )
        .await?
        .into_sent("sendDocument")
    }

    async fn send_media_group(
        &self,
        chat: ChatId,
        media: &[InputMedia],
    ) -> Result<Vec<i64>, GatewayError> {
        let entries: Vec<serde_json::Value> = media
            .iter()
            .map(|m| {
                let mut entry = json!({
                    "type": m.kind.api_name(),
                    "media": m.file_id,
                });
                if let Some(caption) = &m.caption {
                    entry["caption"] = json!(caption);
                }
                entry
            })
            .collect();

        let messages: Vec<ApiMessage> = self
            .call(
                "sendMediaGroup",
                json!({ "chat_id": chat, "media": entries }),
            )
            .await?;
        Ok(messages.into_iter().map(|m| m.message_id).collect())
    }

    async fn delete_messages(
        &self,
        chat: ChatId,
        message_ids: &[i64],
    ) -> Result<(), GatewayError> {
        let _: bool = self
            .call(
                "deleteMessages",
                json!({ "chat_id": chat, "message_ids": message_ids }),
            )
            .await?;
        Ok(())
    }
}
