//! Core types and functionality for Patrol.
//!
//! This module contains the fundamental data structures used throughout
//! the bot: the checklist catalog, per-chat sessions, configuration, and
//! the conversation state machine.

mod catalog;
mod config;
mod machine;
mod session;

pub use catalog::{Catalog, Location};
pub use config::{Settings, DEFAULT_MODEL, DEFAULT_OPENAI_BASE_URL};
pub use machine::{AttachmentRef, Engine, Incoming, Keyboard, Reply};
pub use session::{Answer, Phase, Session, SessionStore};
