//! Summary requester.
//!
//! A finished checklist run is flattened into one transcript string and
//! handed to a [`Summarizer`]. The only shipped implementation streams
//! from an OpenAI-compatible chat-completions endpoint; tests substitute
//! their own.

mod openai;

pub use openai::OpenAiSummarizer;

use async_trait::async_trait;

use crate::core::{Answer, Catalog, Session};

/// What the user sees when the summary request fails, whatever the cause.
pub const SUMMARY_FALLBACK: &str = "Error in processing the request.";

/// Placeholder for a checklist slot that never got an answer. With the
/// machine enforcing one answer per item this only shows up if the
/// catalog changed size mid-run.
const NO_RESPONSE: &str = "No response";

/// External summarization service.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a free-text analysis of the transcript. Returns only after
    /// the full response has been accumulated.
    async fn summarize(&self, transcript: &str) -> Result<String, SummaryError>;

    /// Provider name, for logging.
    fn name(&self) -> &str;
}

/// Why a summary request failed. Every variant degrades to the same user
/// message; the distinction exists for the logs.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed stream: {0}")]
    MalformedStream(String),
}

/// Flatten a session into the transcript submitted for analysis.
///
/// The location token is mapped to its display name when known; answers
/// appear in checklist order under their question.
pub fn build_transcript(catalog: &Catalog, session: &Session) -> String {
    let location = session
        .location
        .as_deref()
        .map_or("Unknown location", |token| catalog.location_label(token));

    let mut transcript = format!("Location: {location}\n\nChecklist Q&A:\n");
    for (index, question) in catalog.questions().iter().enumerate() {
        let answer = session
            .answers
            .get(index)
            .and_then(Option::as_ref)
            .map_or(NO_RESPONSE, Answer::as_text);
        transcript.push_str(&format!("Q: {question} A: {answer}\n"));
    }
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_maps_location_token() {
        let catalog = Catalog::default();
        let mut session = Session::new(catalog.len());
        session.location = Some("\u{1F1EB}\u{1F1F7}".to_string());

        let transcript = build_transcript(&catalog, &session);
        assert!(transcript.starts_with("Location: France\n"));
    }

    #[test]
    fn test_transcript_contains_comment_verbatim() {
        let catalog = Catalog::default();
        let mut session = Session::new(catalog.len());
        session.location = Some("Paris".to_string());
        session.answers[0] = Some(Answer::Skipped);
        session.answers[1] = Some(Answer::Commented("two bolts missing".to_string()));

        let transcript = build_transcript(&catalog, &session);
        assert!(transcript
            .contains(&format!("Q: {} A: No\n", catalog.question(0).unwrap())));
        assert!(transcript
            .contains(&format!("Q: {} A: two bolts missing\n", catalog.question(1).unwrap())));
    }

    #[test]
    fn test_transcript_placeholder_for_missing_answers() {
        let catalog = Catalog::default();
        let session = Session::new(catalog.len());

        let transcript = build_transcript(&catalog, &session);
        assert!(transcript.starts_with("Location: Unknown location\n"));
        assert_eq!(
            transcript.matches("A: No response").count(),
            catalog.len()
        );
    }

    #[test]
    fn test_transcript_lists_every_question_in_order() {
        let catalog = Catalog::default();
        let session = Session::new(catalog.len());
        let transcript = build_transcript(&catalog, &session);

        let mut cursor = 0;
        for question in catalog.questions() {
            let position = transcript[cursor..]
                .find(question.as_str())
                .expect("question missing from transcript");
            cursor += position;
        }
    }
}
