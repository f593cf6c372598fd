use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use vocab_core::generator;
use vocab_core::model::{Question, QuizError, QuizKind, QuizResult, WordEntry};

use super::session::{AnswerOutcome, QuizEffect, QuizSession};
use crate::Clock;
use crate::error::QuizFlowError;
use crate::progress_store::ProgressStore;

/// Random source shared by every quiz a service starts.
pub type SharedRng = Arc<Mutex<StdRng>>;

/// Orchestrates quiz start and persisted answering.
///
/// Every state change that needs persisting is written through
/// `ProgressStore` before the call returns.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    progress: Arc<ProgressStore>,
    rng: SharedRng,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<ProgressStore>) -> Self {
        Self {
            clock,
            progress,
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
        }
    }

    /// Use a seeded random source so question order is reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn progress(&self) -> &Arc<ProgressStore> {
        &self.progress
    }

    /// Generate up to `count` questions with the shared random source.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InsufficientData` if distractors run short.
    pub fn build_questions(
        &self,
        pool: &[WordEntry],
        distractor_source: &[WordEntry],
        count: usize,
    ) -> Result<Vec<Question>, QuizError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        generator::generate_questions(pool, distractor_source, count, &mut *rng)
    }

    /// Build and start a quiz of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if no valid question list can be built.
    pub fn start_quiz(
        &self,
        kind: QuizKind,
        pool: &[WordEntry],
        distractor_source: &[WordEntry],
        count: usize,
    ) -> Result<QuizSession, QuizError> {
        let questions = self.build_questions(pool, distractor_source, count)?;
        let mut session = QuizSession::new(kind);
        session.start(questions, self.clock.now())?;
        debug!(?kind, questions = session.total(), "quiz started");
        Ok(session)
    }

    /// Answer the current question and persist a miss.
    ///
    /// Returns `Ok(None)` when the session was not awaiting an answer.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::Progress` if the miss cannot be written.
    pub async fn answer_current(
        &self,
        session: &mut QuizSession,
        selected: &str,
    ) -> Result<Option<AnswerOutcome>, QuizFlowError> {
        let outcome = session.answer(selected, self.clock.now());
        self.apply_outcome(outcome).await
    }

    /// Expire the timer for `question_index` and persist the resulting miss.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::Progress` if the miss cannot be written.
    pub async fn expire_current(
        &self,
        session: &mut QuizSession,
        question_index: usize,
    ) -> Result<Option<AnswerOutcome>, QuizFlowError> {
        let outcome = session.expire(question_index, self.clock.now());
        self.apply_outcome(outcome).await
    }

    /// Move past the feedback screen. Returns the result once the quiz completes.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::Quiz` for an invalid transition and
    /// `QuizFlowError::Progress` if the completed quiz cannot be written.
    pub async fn advance(
        &self,
        session: &mut QuizSession,
    ) -> Result<Option<QuizResult>, QuizFlowError> {
        let Some(effect) = session.advance(self.clock.now())? else {
            return Ok(None);
        };
        let completed = match &effect {
            QuizEffect::RecordCompletion(result) => Some(result.clone()),
            QuizEffect::RecordMiss(_) => None,
        };
        self.apply(effect).await?;
        Ok(completed)
    }

    async fn apply_outcome(
        &self,
        outcome: Option<AnswerOutcome>,
    ) -> Result<Option<AnswerOutcome>, QuizFlowError> {
        let Some(outcome) = outcome else {
            return Ok(None);
        };
        if let Some(effect) = &outcome.effect {
            self.apply(effect.clone()).await?;
        }
        Ok(Some(outcome))
    }

    async fn apply(&self, effect: QuizEffect) -> Result<(), QuizFlowError> {
        match effect {
            QuizEffect::RecordMiss(entry) => {
                self.progress.record_miss(&entry, self.clock.now()).await?;
            }
            QuizEffect::RecordCompletion(result) => {
                self.progress.record_quiz_completion(result).await?;
            }
        }
        Ok(())
    }
}
