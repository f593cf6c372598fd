use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::word::MIN_PLAYABLE_WORDS;
use crate::model::WordEntry;

/// Version written by `ProgressRecord::to_json`.
pub const PROGRESS_FORMAT_VERSION: u32 = 2;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Persisted progress could not be understood.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressParseError {
    #[error("progress record is not valid JSON in any known shape: {0}")]
    Json(#[from] serde_json::Error),

    #[error("progress record version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

//
// ─── ENTRIES ───────────────────────────────────────────────────────────────────
//

/// Mistake counter for a single word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissedWord {
    pub word: String,
    pub meaning: String,
    pub missed_count: u32,
    pub last_missed: DateTime<Utc>,
}

impl MissedWord {
    #[must_use]
    pub fn entry(&self) -> WordEntry {
        WordEntry::new(self.word.clone(), self.meaning.clone())
    }
}

/// Which flow produced a completed quiz.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizKind {
    #[default]
    Custom,
    Remediation,
    Daily,
}

/// Summary of one completed quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub kind: QuizKind,
}

impl QuizResult {
    #[must_use]
    pub fn new(score: u32, total: u32, timestamp: DateTime<Utc>, kind: QuizKind) -> Self {
        Self {
            score,
            total,
            timestamp,
            kind,
        }
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.score == self.total
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// Shape a persisted record was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressFormat {
    Current,
    /// Bare `{ word: MissedWord }` map without a version.
    LegacyWordMap,
    /// `{ weakWords, quizHistory }` list variant.
    LegacyWeakWords,
}

/// Per-word mistake counters plus the history of completed quizzes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    words: BTreeMap<String, MissedWord>,
    history: Vec<QuizResult>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.history.is_empty()
    }

    /// Number of tracked words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn get(&self, word: &str) -> Option<&MissedWord> {
        self.words.get(word)
    }

    /// Completed quizzes, oldest first.
    #[must_use]
    pub fn history(&self) -> &[QuizResult] {
        &self.history
    }

    /// Counts a miss for `entry`, inserting it on first miss.
    pub fn record_miss(&mut self, entry: &WordEntry, at: DateTime<Utc>) -> &MissedWord {
        self.words
            .entry(entry.word.clone())
            .and_modify(|missed| {
                missed.missed_count = missed.missed_count.saturating_add(1);
                missed.last_missed = at;
            })
            .or_insert_with(|| MissedWord {
                word: entry.word.clone(),
                meaning: entry.meaning.clone(),
                missed_count: 1,
                last_missed: at,
            })
    }

    pub fn record_completion(&mut self, result: QuizResult) {
        self.history.push(result);
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.history.clear();
    }

    //
    // ─── AGGREGATES ───────────────────────────────────────────────────────────
    //

    /// Tracked words, most missed first; ties go to the most recently missed.
    #[must_use]
    pub fn tracked_words(&self) -> Vec<&MissedWord> {
        let mut words: Vec<&MissedWord> = self.words.values().collect();
        words.sort_by(|a, b| compare_tracked(a, b));
        words
    }

    /// Tracked words as plain entries, in `tracked_words` order.
    #[must_use]
    pub fn tracked_entries(&self) -> Vec<WordEntry> {
        self.tracked_words()
            .into_iter()
            .map(MissedWord::entry)
            .collect()
    }

    #[must_use]
    pub fn total_mistakes(&self) -> u64 {
        self.words
            .values()
            .map(|missed| u64::from(missed.missed_count))
            .sum()
    }

    #[must_use]
    pub fn eligible_for_remediation_quiz(&self) -> bool {
        self.words.len() >= MIN_PLAYABLE_WORDS
    }

    //
    // ─── PERSISTENCE SHAPE ────────────────────────────────────────────────────
    //

    /// Serializes the record in the current format.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&PersistedCurrent {
            version: PROGRESS_FORMAT_VERSION,
            words: self.words.clone(),
            history: self.history.clone(),
        })
    }

    /// Parses a persisted record, migrating legacy shapes.
    ///
    /// `migrated_at` stands in for `lastMissed` when a legacy weak-word list
    /// carries no timestamps of its own.
    ///
    /// # Errors
    ///
    /// Returns `ProgressParseError` when the text matches no known shape.
    pub fn from_json(
        json: &str,
        migrated_at: DateTime<Utc>,
    ) -> Result<(Self, ProgressFormat), ProgressParseError> {
        let parsed: PersistedProgress = serde_json::from_str(json)?;
        match parsed {
            PersistedProgress::Current(current) => {
                if current.version > PROGRESS_FORMAT_VERSION {
                    return Err(ProgressParseError::UnsupportedVersion {
                        found: current.version,
                        supported: PROGRESS_FORMAT_VERSION,
                    });
                }
                Ok((
                    Self::from_parts(current.words.into_values(), current.history),
                    ProgressFormat::Current,
                ))
            }
            PersistedProgress::WeakWords(legacy) => {
                let last_missed = legacy
                    .quiz_history
                    .iter()
                    .map(|result| result.timestamp)
                    .max()
                    .unwrap_or(migrated_at);
                let words = legacy.weak_words.into_iter().map(|weak| {
                    let entry = weak.into_entry();
                    MissedWord {
                        word: entry.word,
                        meaning: entry.meaning,
                        missed_count: 1,
                        last_missed,
                    }
                });
                Ok((
                    Self::from_parts(words, legacy.quiz_history),
                    ProgressFormat::LegacyWeakWords,
                ))
            }
            PersistedProgress::WordMap(map) => Ok((
                Self::from_parts(map.into_values(), Vec::new()),
                ProgressFormat::LegacyWordMap,
            )),
        }
    }

    fn from_parts(
        words: impl IntoIterator<Item = MissedWord>,
        mut history: Vec<QuizResult>,
    ) -> Self {
        let words = words
            .into_iter()
            .filter(|missed| missed.missed_count > 0 && !missed.word.trim().is_empty())
            .map(|missed| (missed.word.clone(), missed))
            .collect();
        history.sort_by_key(|result| result.timestamp);
        Self { words, history }
    }
}

fn compare_tracked(a: &MissedWord, b: &MissedWord) -> Ordering {
    b.missed_count
        .cmp(&a.missed_count)
        .then_with(|| b.last_missed.cmp(&a.last_missed))
        .then_with(|| a.word.cmp(&b.word))
}

#[derive(Serialize, Deserialize)]
struct PersistedCurrent {
    version: u32,
    words: BTreeMap<String, MissedWord>,
    #[serde(default)]
    history: Vec<QuizResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyWeakWords {
    weak_words: Vec<LegacyWeakWord>,
    #[serde(default)]
    quiz_history: Vec<QuizResult>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyWeakWord {
    Word(String),
    Entry(WordEntry),
}

impl LegacyWeakWord {
    fn into_entry(self) -> WordEntry {
        match self {
            LegacyWeakWord::Word(word) => WordEntry::new(word, String::new()),
            LegacyWeakWord::Entry(entry) => entry,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedProgress {
    Current(PersistedCurrent),
    WeakWords(LegacyWeakWords),
    WordMap(BTreeMap<String, MissedWord>),
}
