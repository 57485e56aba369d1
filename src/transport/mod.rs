//! Transport adapter.
//!
//! The state machine talks to the chat platform through two narrow
//! seams: [`ChatTransport`] delivers replies (with keyboard hints) and
//! [`AttachmentResolver`] turns an uploaded photo into a durable URL.
//! The Telegram Bot API implementation lives in [`TelegramTransport`].

mod telegram;

pub use telegram::{PhotoSize, TelegramChat, TelegramMessage, TelegramTransport, TelegramUpdate};

use async_trait::async_trait;

use crate::core::{AttachmentRef, Reply};

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver one reply to a chat.
    async fn send(&self, chat_id: i64, reply: &Reply) -> anyhow::Result<()>;
}

/// Resolves an uploaded attachment to a durable URL.
#[async_trait]
pub trait AttachmentResolver: Send + Sync {
    async fn resolve_url(&self, attachment: &AttachmentRef) -> anyhow::Result<String>;
}
