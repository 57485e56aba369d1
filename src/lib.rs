#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

//! # Patrol
//!
//! Telegram inspection-checklist bot with AI-generated summaries.
//!
//! Patrol walks a user through a fixed checklist over Telegram. Every item
//! is resolved either with "No" (nothing to report) or with a free-text
//! comment plus a photo as evidence. When the checklist is complete, the
//! collected transcript is sent to an OpenAI-compatible chat-completions
//! endpoint and the streamed analysis is relayed back to the user.
//!
//! ## Architecture
//!
//! - [`core`] — the checklist catalog, per-chat sessions, and the
//!   conversation state machine. No I/O beyond the two trait seams.
//! - [`ai`] — the [`ai::Summarizer`] seam and its streaming OpenAI
//!   implementation.
//! - [`transport`] — the Telegram Bot API adapter (long polling,
//!   keyboards, photo URL resolution).
//! - [`app`] — wiring plus the per-chat dispatch loop.

pub mod ai;
pub mod app;
pub mod core;
pub mod transport;

pub use ai::{build_transcript, OpenAiSummarizer, Summarizer, SummaryError};
pub use app::App;
pub use core::{
    Answer, AttachmentRef, Catalog, Engine, Incoming, Keyboard, Phase, Reply, Session,
    SessionStore, Settings,
};
pub use transport::{AttachmentResolver, ChatTransport, TelegramTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "patrol";
