use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of distinct words a dataset needs before a quiz can be played.
pub const MIN_PLAYABLE_WORDS: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// The backend returned rows that cannot be turned into a playable dataset.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DataShapeError {
    #[error("need at least {required} usable words, found {found}")]
    TooFewWords { found: usize, required: usize },

    #[error("malformed dataset rows: {0}")]
    MalformedRows(String),
}

//
// ─── WORD ENTRY ────────────────────────────────────────────────────────────────
//

/// One vocabulary item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub meaning: String,
}

impl WordEntry {
    #[must_use]
    pub fn new(word: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            meaning: meaning.into(),
        }
    }
}

/// Loosely typed row as produced by the backend; either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawWordRow {
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub meaning: Option<String>,
}

//
// ─── DATASET ───────────────────────────────────────────────────────────────────
//

/// Ordered collection of distinct words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    entries: Vec<WordEntry>,
}

impl Dataset {
    /// Builds a dataset, keeping the first occurrence of each word.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = WordEntry>) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.word.clone()))
            .collect();
        Self { entries }
    }

    /// Builds a dataset from backend rows.
    ///
    /// Words and meanings are trimmed; rows with a blank word or meaning are
    /// dropped and duplicate words keep their first occurrence.
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = RawWordRow>) -> Self {
        Self::new(rows.into_iter().filter_map(|row| {
            let word = row.word?.trim().to_owned();
            let meaning = row.meaning?.trim().to_owned();
            if word.is_empty() || meaning.is_empty() {
                return None;
            }
            Some(WordEntry { word, meaning })
        }))
    }

    #[must_use]
    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the dataset has enough words to build distractors.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.entries.len() >= MIN_PLAYABLE_WORDS
    }

    /// Returns the dataset when it is playable.
    ///
    /// # Errors
    ///
    /// Returns `DataShapeError::TooFewWords` when fewer than four words remain.
    pub fn require_playable(self) -> Result<Self, DataShapeError> {
        if self.is_playable() {
            Ok(self)
        } else {
            Err(DataShapeError::TooFewWords {
                found: self.entries.len(),
                required: MIN_PLAYABLE_WORDS,
            })
        }
    }
}

impl FromIterator<WordEntry> for Dataset {
    fn from_iter<T: IntoIterator<Item = WordEntry>>(iter: T) -> Self {
        Self::new(iter)
    }
}
