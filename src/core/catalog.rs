//! Checklist catalog.
//!
//! The catalog is the static data behind a checklist run: the ordered
//! questions, the selectable locations, and the two accepted answer
//! tokens. A built-in default catalog ships with the binary; a TOML file
//! can replace it without recompiling.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// A selectable location: the token shown on the keyboard (a flag emoji)
/// and the display name used when the transcript is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Keyboard token, e.g. "🇫🇷"
    pub token: String,

    /// Display name, e.g. "France"
    pub label: String,
}

/// Immutable checklist catalog, fixed for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Ordered checklist questions
    questions: Vec<String>,

    /// Locations offered at the start of a run
    locations: Vec<Location>,

    /// Accepted answer tokens for a checklist item
    answers: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        let questions = [
            "Is there any visible damage to the equipment?",
            "Are any safety signs missing or unreadable?",
            "Is the work area blocked or cluttered?",
            "Are any fire extinguishers missing from their stations?",
            "Is any protective gear missing or damaged?",
        ];
        let locations = [
            ("\u{1F1EB}\u{1F1F7}", "France"),
            ("\u{1F1E9}\u{1F1EA}", "Germany"),
            ("\u{1F1EA}\u{1F1F8}", "Spain"),
            ("\u{1F1EE}\u{1F1F9}", "Italy"),
            ("\u{1F1EC}\u{1F1E7}", "United Kingdom"),
        ];

        Self {
            questions: questions.iter().map(ToString::to_string).collect(),
            locations: locations
                .iter()
                .map(|(token, label)| Location {
                    token: (*token).to_string(),
                    label: (*label).to_string(),
                })
                .collect(),
            answers: vec!["No".to_string(), "Comment".to_string()],
        }
    }
}

impl Catalog {
    /// Load a catalog from a TOML file.
    ///
    /// Fields left out of the file fall back to the built-in defaults, so
    /// a file containing only `questions` is valid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file {}", path.display()))?;
        let catalog: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse catalog file {}", path.display()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check the catalog invariants.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.questions.is_empty(), "catalog has no checklist questions");
        ensure!(!self.locations.is_empty(), "catalog has no locations");
        ensure!(!self.answers.is_empty(), "catalog has no answer tokens");
        Ok(())
    }

    /// Number of checklist items.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the catalog has no questions. A validated catalog never is.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The question at `index`, if it exists.
    pub fn question(&self, index: usize) -> Option<&str> {
        self.questions.get(index).map(String::as_str)
    }

    /// All questions, in checklist order.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    /// Keyboard tokens for the location prompt.
    pub fn location_options(&self) -> Vec<String> {
        self.locations.iter().map(|l| l.token.clone()).collect()
    }

    /// Keyboard tokens for a checklist question.
    pub fn answer_options(&self) -> Vec<String> {
        self.answers.clone()
    }

    /// Display name for a location token. Unknown tokens are passed
    /// through unchanged, since the keyboard is a hint and free text can
    /// always arrive.
    pub fn location_label<'a>(&'a self, token: &'a str) -> &'a str {
        self.locations
            .iter()
            .find(|l| l.token == token)
            .map_or(token, |l| l.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = Catalog::default();
        assert!(catalog.validate().is_ok());
        assert!(catalog.len() >= 2);
        assert_eq!(catalog.answer_options(), vec!["No", "Comment"]);
    }

    #[test]
    fn test_location_label_maps_known_token() {
        let catalog = Catalog::default();
        assert_eq!(catalog.location_label("\u{1F1EB}\u{1F1F7}"), "France");
    }

    #[test]
    fn test_location_label_passes_through_unknown_token() {
        let catalog = Catalog::default();
        assert_eq!(catalog.location_label("Paris"), "Paris");
    }

    #[test]
    fn test_from_path_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "questions = [\"Is the door locked?\"]").unwrap();

        let catalog = Catalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.question(0), Some("Is the door locked?"));
        // Locations and answers fall back to the defaults.
        assert!(!catalog.location_options().is_empty());
        assert_eq!(catalog.answer_options(), vec!["No", "Comment"]);
    }

    #[test]
    fn test_from_path_rejects_empty_question_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "questions = []").unwrap();

        assert!(Catalog::from_path(file.path()).is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        assert!(Catalog::from_path("/nonexistent/catalog.toml").is_err());
    }
}
