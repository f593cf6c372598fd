use std::sync::Arc;

use chrono::{DateTime, Utc};

use vocab_core::model::{QuizError, QuizKind, QuizResult};
use vocab_core::time::relative_time;

use crate::error::ProgressStoreError;
use crate::quiz::{QuizLoopService, QuizSession};

/// Questions in a remediation quiz, clamped to the number of tracked words.
pub const REMEDIATION_QUIZ_QUESTIONS: usize = 5;

/// Number of most recent quizzes shown on the dashboard.
pub const RECENT_QUIZZES: usize = 5;

/// A tracked word as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedWordView {
    pub word: String,
    pub meaning: String,
    pub missed_count: u32,
    pub last_missed: DateTime<Utc>,
    /// Human label such as "3 minutes ago".
    pub last_missed_label: String,
}

/// Everything the progress dashboard displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub tracked: Vec<TrackedWordView>,
    pub total_mistakes: u64,
    pub quizzes_completed: usize,
    /// Newest first.
    pub recent: Vec<QuizResult>,
    pub can_practice: bool,
}

impl DashboardSummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty() && self.recent.is_empty()
    }
}

/// Read model over stored progress plus the remediation quiz entry point.
#[derive(Clone)]
pub struct DashboardService {
    quiz: Arc<QuizLoopService>,
}

impl DashboardService {
    #[must_use]
    pub fn new(quiz: Arc<QuizLoopService>) -> Self {
        Self { quiz }
    }

    pub async fn summary(&self) -> DashboardSummary {
        let record = self.quiz.progress().snapshot().await;
        let now = self.quiz.clock().now();

        let tracked = record
            .tracked_words()
            .into_iter()
            .map(|missed| TrackedWordView {
                word: missed.word.clone(),
                meaning: missed.meaning.clone(),
                missed_count: missed.missed_count,
                last_missed: missed.last_missed,
                last_missed_label: relative_time(missed.last_missed, now),
            })
            .collect();

        DashboardSummary {
            tracked,
            total_mistakes: record.total_mistakes(),
            quizzes_completed: record.history().len(),
            recent: record.history().iter().rev().take(RECENT_QUIZZES).cloned().collect(),
            can_practice: record.eligible_for_remediation_quiz(),
        }
    }

    /// Start a quiz over the tracked words only.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InsufficientData` while fewer than four words are
    /// tracked.
    pub async fn start_remediation_quiz(&self) -> Result<QuizSession, QuizError> {
        let entries = self.quiz.progress().snapshot().await.tracked_entries();
        self.quiz.start_quiz(
            QuizKind::Remediation,
            &entries,
            &entries,
            REMEDIATION_QUIZ_QUESTIONS,
        )
    }

    /// Forget all tracked words and quiz history.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError` if stored progress cannot be removed.
    pub async fn clear_progress(&self) -> Result<(), ProgressStoreError> {
        self.quiz.progress().clear_all().await
    }
}
