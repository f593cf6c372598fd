use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::WordEntry;

/// Number of options shown for every question.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Number of incorrect options paired with the correct answer.
pub const DISTRACTORS_PER_QUESTION: usize = OPTIONS_PER_QUESTION - 1;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised while building or driving a quiz.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    Empty,

    #[error("not enough distinct words for distractors: {available} available, {required} required")]
    InsufficientData { available: usize, required: usize },

    #[error("question options must contain {expected} distinct words including the answer")]
    MalformedQuestion { expected: usize },

    #[error("{action} is not allowed while the quiz is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One multiple-choice question: pick the word matching `prompt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    answer: WordEntry,
    options: Vec<String>,
}

impl Question {
    /// Builds a question from the correct entry and the already ordered options.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::MalformedQuestion` if the options are not four
    /// distinct words containing the answer.
    pub fn new(answer: WordEntry, options: Vec<String>) -> Result<Self, QuizError> {
        let distinct: HashSet<&str> = options.iter().map(String::as_str).collect();
        if options.len() != OPTIONS_PER_QUESTION
            || distinct.len() != OPTIONS_PER_QUESTION
            || !distinct.contains(answer.word.as_str())
        {
            return Err(QuizError::MalformedQuestion {
                expected: OPTIONS_PER_QUESTION,
            });
        }
        Ok(Self { answer, options })
    }

    /// The meaning the player has to match.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.answer.meaning
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The correct word.
    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer.word
    }

    /// The correct entry, copied from the source dataset.
    #[must_use]
    pub fn answer_entry(&self) -> &WordEntry {
        &self.answer
    }

    #[must_use]
    pub fn is_correct(&self, selected: &str) -> bool {
        self.answer.word == selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_owned()).collect()
    }

    #[test]
    fn accepts_four_distinct_options_with_answer() {
        let q = Question::new(
            WordEntry::new("candid", "Truthful and straightforward"),
            options(&["terse", "candid", "ornate", "vivid"]),
        )
        .unwrap();
        assert_eq!(q.prompt(), "Truthful and straightforward");
        assert_eq!(q.answer(), "candid");
        assert!(q.is_correct("candid"));
        assert!(!q.is_correct("terse"));
    }

    #[test]
    fn rejects_duplicates_and_missing_answer() {
        let entry = WordEntry::new("candid", "Truthful");
        let dup = Question::new(entry.clone(), options(&["candid", "candid", "a", "b"]));
        assert!(matches!(dup, Err(QuizError::MalformedQuestion { .. })));

        let missing = Question::new(entry.clone(), options(&["a", "b", "c", "d"]));
        assert!(missing.is_err());

        let short = Question::new(entry, options(&["candid", "a", "b"]));
        assert!(short.is_err());
    }
}
