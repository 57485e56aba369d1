//! Conversation state machine.
//!
//! [`Engine::handle`] maps (current phase, incoming message) to a list of
//! replies and the next phase. Invalid input never errors out of the
//! machine: every unrecognized message re-prompts with guidance and
//! leaves the phase unchanged.
//!
//! The engine has exactly two suspension points, both behind trait
//! seams: the summary request at the end of a run and the photo URL
//! resolution in the photo phase.

use std::sync::Arc;

use crate::ai::{build_transcript, Summarizer, SUMMARY_FALLBACK};
use crate::core::{Answer, Catalog, Phase, Session};
use crate::transport::AttachmentResolver;

const GREETING: &str = "Hello. \u{1F44B} Let's get started.";
const LOCATION_PROMPT: &str = "Choose a location:";
const ANSWER_REMINDER: &str = "Please answer with 'No' or 'Comment'.";
const PHOTO_PROMPT: &str = "Please upload a photo:";
const PHOTO_REMINDER: &str = "Please upload a photo.";
const COMPLETED: &str = "Checklist completed! Your report will be generated and analyzed.";
const RESTART_PROMPT: &str = "Click /start to begin again.";
const IDLE_HINT: &str = "Send /start to begin a new checklist.";

/// Opaque transport-side handle for an uploaded photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef(pub String);

/// One inbound user message, already reduced to what the machine needs.
#[derive(Debug, Clone, Default)]
pub struct Incoming {
    pub text: Option<String>,
    pub photo: Option<AttachmentRef>,
}

impl Incoming {
    /// A text-only message.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), photo: None }
    }

    /// A photo message.
    pub fn photo(file_id: impl Into<String>) -> Self {
        Self { text: None, photo: Some(AttachmentRef(file_id.into())) }
    }

    /// Whether this message is the restart command.
    fn is_restart(&self) -> bool {
        self.text
            .as_deref()
            .map(str::trim)
            .is_some_and(|t| t == "/start" || t.starts_with("/start ") || t.starts_with("/start@"))
    }
}

/// Keyboard hint attached to a reply. Valid next tokens only - the user
/// can still type anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Show one button per option
    Options(Vec<String>),
    /// Remove any previously shown keyboard
    Remove,
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub markdown: bool,
}

impl Reply {
    /// Plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), keyboard: None, markdown: false }
    }

    /// Attach an options keyboard.
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.keyboard = Some(Keyboard::Options(options));
        self
    }

    /// Remove the keyboard on the client.
    pub fn without_keyboard(mut self) -> Self {
        self.keyboard = Some(Keyboard::Remove);
        self
    }

    /// Render the text as Markdown.
    pub fn as_markdown(mut self) -> Self {
        self.markdown = true;
        self
    }
}

/// Phase-conditioned router for one checklist conversation.
pub struct Engine {
    catalog: Arc<Catalog>,
    summarizer: Arc<dyn Summarizer>,
    resolver: Arc<dyn AttachmentResolver>,
}

impl Engine {
    pub fn new(
        catalog: Arc<Catalog>,
        summarizer: Arc<dyn Summarizer>,
        resolver: Arc<dyn AttachmentResolver>,
    ) -> Self {
        Self { catalog, summarizer, resolver }
    }

    /// Apply one transition and return the replies to send, in order.
    pub async fn handle(&self, session: &mut Session, incoming: &Incoming) -> Vec<Reply> {
        if incoming.is_restart() {
            return self.restart(session);
        }

        match session.phase {
            Phase::Idle => vec![Reply::text(IDLE_HINT)],
            Phase::AwaitingLocation => self.handle_location(session, incoming),
            Phase::AwaitingChecklistAnswer => self.handle_answer(session, incoming).await,
            Phase::AwaitingComment => self.handle_comment(session, incoming),
            Phase::AwaitingPhoto => self.handle_photo(session, incoming).await,
        }
    }

    /// `/start` from any phase: clear the session and greet.
    fn restart(&self, session: &mut Session) -> Vec<Reply> {
        session.reset();
        session.phase = Phase::AwaitingLocation;
        vec![
            Reply::text(GREETING),
            Reply::text(LOCATION_PROMPT).with_options(self.catalog.location_options()),
        ]
    }

    fn handle_location(&self, session: &mut Session, incoming: &Incoming) -> Vec<Reply> {
        match incoming.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                session.location = Some(text.to_string());
                session.index = 0;
                session.phase = Phase::AwaitingChecklistAnswer;
                vec![self.question_reply(0)]
            }
            _ => vec![Reply::text(LOCATION_PROMPT).with_options(self.catalog.location_options())],
        }
    }

    async fn handle_answer(&self, session: &mut Session, incoming: &Incoming) -> Vec<Reply> {
        let text = incoming.text.as_deref().map(str::trim).unwrap_or_default();
        match text.to_lowercase().as_str() {
            "comment" => {
                session.phase = Phase::AwaitingComment;
                let question = self.catalog.question(session.index).unwrap_or_default();
                vec![
                    Reply::text(format!("Please leave your comment for '{question}'."))
                        .without_keyboard(),
                ]
            }
            "no" => {
                session.record(Answer::Skipped);
                self.advance(session).await
            }
            _ => vec![Reply::text(ANSWER_REMINDER).with_options(self.catalog.answer_options())],
        }
    }

    fn handle_comment(&self, session: &mut Session, incoming: &Incoming) -> Vec<Reply> {
        match incoming.text.as_deref() {
            Some(text) if !text.trim().is_empty() => {
                session.record(Answer::Commented(text.to_string()));
                session.phase = Phase::AwaitingPhoto;
                vec![Reply::text(PHOTO_PROMPT)]
            }
            _ => {
                let question = self.catalog.question(session.index).unwrap_or_default();
                vec![Reply::text(format!("Please leave your comment for '{question}'."))]
            }
        }
    }

    async fn handle_photo(&self, session: &mut Session, incoming: &Incoming) -> Vec<Reply> {
        let Some(attachment) = &incoming.photo else {
            return vec![Reply::text(PHOTO_REMINDER)];
        };

        match self.resolver.resolve_url(attachment).await {
            Ok(url) => {
                session.photo_url = Some(url.clone());
                let mut replies =
                    vec![Reply::text(format!("Here is the link to [Your Photo]({url})"))
                        .as_markdown()];
                replies.extend(self.advance(session).await);
                replies
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to resolve photo URL");
                vec![Reply::text(PHOTO_REMINDER)]
            }
        }
    }

    /// Move past the current item: next question, or wrap up the run.
    async fn advance(&self, session: &mut Session) -> Vec<Reply> {
        if session.index + 1 < self.catalog.len() {
            session.index += 1;
            session.phase = Phase::AwaitingChecklistAnswer;
            return vec![self.question_reply(session.index)];
        }

        let transcript = build_transcript(&self.catalog, session);
        let analysis = match self.summarizer.summarize(&transcript).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(
                    summarizer = self.summarizer.name(),
                    error = %error,
                    "summary request failed"
                );
                SUMMARY_FALLBACK.to_string()
            }
        };
        session.reset();

        vec![
            Reply::text(COMPLETED),
            Reply::text(format!("Analysis: {analysis}")),
            Reply::text(RESTART_PROMPT).with_options(vec!["/start".to_string()]),
        ]
    }

    fn question_reply(&self, index: usize) -> Reply {
        let question = self.catalog.question(index).unwrap_or_default();
        Reply::text(format!("{question} (No/Comment)"))
            .with_options(self.catalog.answer_options())
    }
}
