//! Application wiring and dispatch loop.
//!
//! `App::run` long-polls Telegram and fans each update out to a per-chat
//! worker task. One worker per chat id means a user's messages are
//! applied strictly in order, while different chats proceed
//! concurrently. Workers live for the process lifetime, like the
//! sessions they drive: neither is evicted for idle chats, so memory
//! grows with the number of distinct chats ever seen, one task and one
//! small session each.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::ai::OpenAiSummarizer;
use crate::core::{Catalog, Engine, Incoming, SessionStore, Settings};
use crate::transport::{ChatTransport, TelegramTransport};

/// Back-off after a failed poll before retrying.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

/// The assembled bot.
pub struct App {
    engine: Arc<Engine>,
    store: Arc<SessionStore>,
    transport: Arc<TelegramTransport>,
}

impl App {
    /// Wire the engine, session store, and collaborators from settings.
    pub fn new(settings: &Settings, catalog: Catalog) -> Self {
        let items = catalog.len();
        let catalog = Arc::new(catalog);
        let transport = Arc::new(TelegramTransport::new(settings.bot_token.clone()));
        let summarizer = Arc::new(
            OpenAiSummarizer::new(settings.openai_token.clone())
                .with_model(settings.model.clone())
                .with_base_url(settings.openai_base_url.clone())
                .with_timeout(settings.summary_timeout),
        );
        let engine = Arc::new(Engine::new(catalog, summarizer, transport.clone()));

        Self { engine, store: Arc::new(SessionStore::new(items)), transport }
    }

    /// Poll for updates until the process is stopped.
    ///
    /// Sessions are in-memory only, so messages that arrived while the
    /// process was down address conversations that no longer exist. The
    /// backlog is dropped before the first real poll; only messages sent
    /// from now on reach the state machine.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut offset = match self.transport.skip_pending().await {
            Ok(offset) => offset,
            Err(error) => {
                tracing::warn!(error = %error, "could not skip pending updates");
                0
            }
        };
        tracing::info!(offset, "bot started, polling for updates");

        let mut workers: HashMap<i64, mpsc::UnboundedSender<Incoming>> = HashMap::new();

        loop {
            let updates = match self.transport.poll_updates(offset).await {
                Ok(updates) => updates,
                Err(error) => {
                    tracing::warn!(error = %error, "polling failed, retrying");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else { continue };
                let chat_id = message.chat.id;
                let incoming = message.into_incoming();

                let sender = workers
                    .entry(chat_id)
                    .or_insert_with(|| self.spawn_worker(chat_id));
                if sender.send(incoming).is_err() {
                    tracing::error!(chat_id, "chat worker gone, dropping message");
                    workers.remove(&chat_id);
                }
            }
        }
    }

    /// Start the sequential worker for one chat.
    fn spawn_worker(&self, chat_id: i64) -> mpsc::UnboundedSender<Incoming> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Incoming>();
        let engine = self.engine.clone();
        let store = self.store.clone();
        let transport: Arc<TelegramTransport> = self.transport.clone();

        tokio::spawn(async move {
            while let Some(incoming) = receiver.recv().await {
                let cell = store.session(chat_id);
                let mut session = cell.lock().await;
                let replies = engine.handle(&mut session, &incoming).await;
                drop(session);

                for reply in replies {
                    if let Err(error) = transport.send(chat_id, &reply).await {
                        tracing::warn!(chat_id, error = %error, "failed to send reply");
                    }
                }
            }
        });

        sender
    }
}
