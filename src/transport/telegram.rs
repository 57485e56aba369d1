//! Telegram Bot API adapter.
//!
//! Long polling via `getUpdates`, replies via `sendMessage` with reply
//! keyboards, and photo URL resolution via `getFile`. Everything here is
//! thin delegation; the conversation logic lives in `core::machine`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{AttachmentResolver, ChatTransport};
use crate::core::{AttachmentRef, Incoming, Keyboard, Reply};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Long-poll wait in seconds passed to `getUpdates`.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Telegram Bot API client.
pub struct TelegramTransport {
    client: Client,
    token: String,
    base_url: String,
}

impl TelegramTransport {
    /// Create a transport for the given bot token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            base_url: TELEGRAM_API.to_string(),
        }
    }

    /// Use a custom API root (test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &impl Serialize,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .with_context(|| format!("telegram {method} request failed"))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("telegram {method} returned invalid JSON"))?;

        if !envelope.ok {
            bail!(
                "telegram {method} error: {}",
                envelope.description.unwrap_or_else(|| "unknown".to_string())
            );
        }
        envelope.result.with_context(|| format!("telegram {method} returned no result"))
    }

    /// Discard updates accumulated while the bot was down and return the
    /// offset to start polling from.
    ///
    /// With `offset = -1` Telegram returns at most the newest pending
    /// update and forgets everything before it; `timeout = 0` makes the
    /// call return immediately when the backlog is empty.
    pub async fn skip_pending(&self) -> Result<i64> {
        let updates: Vec<TelegramUpdate> = self
            .call("getUpdates", &json!({ "offset": -1, "timeout": 0 }))
            .await?;
        Ok(updates.last().map_or(0, |u| u.update_id + 1))
    }

    /// Fetch the next batch of updates, long-polling up to
    /// [`POLL_TIMEOUT_SECS`].
    pub async fn poll_updates(&self, offset: i64) -> Result<Vec<TelegramUpdate>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send(&self, chat_id: i64, reply: &Reply) -> Result<()> {
        let message = SendMessage {
            chat_id,
            text: &reply.text,
            parse_mode: reply.markdown.then_some("Markdown"),
            reply_markup: reply.keyboard.as_ref().map(keyboard_markup),
        };
        let _sent: serde_json::Value = self.call("sendMessage", &message).await?;
        Ok(())
    }
}

#[async_trait]
impl AttachmentResolver for TelegramTransport {
    async fn resolve_url(&self, attachment: &AttachmentRef) -> Result<String> {
        let info: FileInfo =
            self.call("getFile", &json!({ "file_id": attachment.0 })).await?;
        let path = info.file_path.context("getFile returned no file_path")?;
        Ok(format!("{}/file/bot{}/{}", self.base_url, self.token, path))
    }
}

/// One button per row, matching the original keyboard layout.
fn keyboard_markup(keyboard: &Keyboard) -> serde_json::Value {
    match keyboard {
        Keyboard::Options(items) => json!({
            "keyboard": items
                .iter()
                .map(|item| vec![json!({ "text": item })])
                .collect::<Vec<_>>(),
            "resize_keyboard": true,
            "one_time_keyboard": true,
        }),
        Keyboard::Remove => json!({ "remove_keyboard": true }),
    }
}

// Wire types

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Vec<PhotoSize>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
}

impl TelegramMessage {
    /// Reduce a Telegram message to the machine's input. Telegram sends
    /// photo sizes smallest-first; the last entry is the original-size
    /// rendition.
    pub fn into_incoming(self) -> Incoming {
        let photo = self.photo.into_iter().last().map(|p| AttachmentRef(p.file_id));
        Incoming { text: self.text, photo }
    }
}
