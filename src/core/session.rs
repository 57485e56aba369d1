//! Per-chat conversation state.
//!
//! One [`Session`] exists per chat id, held in a [`SessionStore`]. The
//! store hands out each session behind its own async mutex; holding that
//! lock for the whole transition is what keeps one user's messages
//! strictly sequential while other users proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Where one chat currently is in the conversation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No checklist in progress
    #[default]
    Idle,
    /// Greeted, waiting for a location
    AwaitingLocation,
    /// Waiting for "No" or "Comment" on the current item
    AwaitingChecklistAnswer,
    /// Waiting for the free-text comment on the current item
    AwaitingComment,
    /// Waiting for the evidence photo on the current item
    AwaitingPhoto,
}

/// Resolution of one checklist item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// The literal "No" - nothing to report
    Skipped,
    /// A free-text comment (the photo lives on the session)
    Commented(String),
}

impl Answer {
    /// How the answer reads in the transcript.
    pub fn as_text(&self) -> &str {
        match self {
            Answer::Skipped => "No",
            Answer::Commented(text) => text,
        }
    }
}

/// Mutable record of one chat's progress through the checklist.
///
/// `index` is meaningful only while the phase is one of the three
/// item-scoped phases; it is reset together with everything else on
/// restart. Indexing is 0-based throughout.
#[derive(Debug, Clone)]
pub struct Session {
    pub phase: Phase,
    pub location: Option<String>,
    pub index: usize,
    pub answers: Vec<Option<Answer>>,
    pub photo_url: Option<String>,
}

impl Session {
    /// Fresh idle session for a checklist of `items` questions.
    pub fn new(items: usize) -> Self {
        Self {
            phase: Phase::Idle,
            location: None,
            index: 0,
            answers: vec![None; items],
            photo_url: None,
        }
    }

    /// Clear all collected data and return to [`Phase::Idle`].
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.location = None;
        self.index = 0;
        self.answers.fill(None);
        self.photo_url = None;
    }

    /// Record the answer for the current item.
    pub fn record(&mut self, answer: Answer) {
        if let Some(slot) = self.answers.get_mut(self.index) {
            *slot = Some(answer);
        }
    }

    /// Number of items answered so far.
    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether every checklist slot holds an answer.
    pub fn is_complete(&self) -> bool {
        self.answers.iter().all(Option::is_some)
    }
}

/// Concurrent map of chat id to session.
///
/// The outer lock only guards the map itself and is never held across an
/// await; the per-session `tokio` mutex is what serializes transitions
/// for a single chat.
///
/// Entries are never evicted: a chat that was seen once keeps its (idle,
/// reset) session for the process lifetime. At one small struct per chat
/// this is fine for the deployments this bot targets; an eviction pass
/// would be the first thing to add if that changes.
pub struct SessionStore {
    items: usize,
    sessions: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<Session>>>>,
}

impl SessionStore {
    /// Create an empty store for checklists of `items` questions.
    pub fn new(items: usize) -> Self {
        Self { items, sessions: Mutex::new(HashMap::new()) }
    }

    /// Get the session for a chat, creating an idle one on first contact.
    pub fn session(&self, chat_id: i64) -> Arc<tokio::sync::Mutex<Session>> {
        let mut sessions = self.sessions.lock();
        sessions
            .entry(chat_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(Session::new(self.items))))
            .clone()
    }

    /// Number of chats with a session.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether no chat has a session yet.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let session = Session::new(3);
        assert_eq!(session.phase, Phase::Idle);
        assert_eq!(session.answered(), 0);
        assert!(!session.is_complete());
    }

    #[test]
    fn test_record_fills_current_slot() {
        let mut session = Session::new(3);
        session.index = 1;
        session.record(Answer::Commented("broken railing".to_string()));

        assert_eq!(session.answers[1], Some(Answer::Commented("broken railing".to_string())));
        assert_eq!(session.answered(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = Session::new(2);
        session.phase = Phase::AwaitingPhoto;
        session.location = Some("France".to_string());
        session.index = 1;
        session.record(Answer::Skipped);
        session.photo_url = Some("https://example.com/p.jpg".to_string());

        session.reset();

        assert_eq!(session.phase, Phase::Idle);
        assert_eq!(session.location, None);
        assert_eq!(session.index, 0);
        assert_eq!(session.answered(), 0);
        assert_eq!(session.photo_url, None);
    }

    #[test]
    fn test_store_returns_same_session_per_chat() {
        let store = SessionStore::new(2);
        let first = store.session(42);
        let second = store.session(42);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);

        let other = store.session(7);
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(store.len(), 2);
    }
}
