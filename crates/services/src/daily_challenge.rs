use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use storage::keys;
use storage::repository::LocalStore;
use vocab_core::model::{
    DAILY_CHALLENGE_QUESTIONS, QuizKind, QuizResult, curated_words, daily_challenge_available,
    format_challenge_date, parse_challenge_date,
};

use crate::error::DailyChallengeError;
use crate::quiz::{AnswerOutcome, QuizLoopService, QuizSession};

/// Whether today's challenge can still be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyChallengeStatus {
    Available,
    AlreadyCompleted { on: NaiveDate },
}

/// Once-per-day quiz over the curated word list.
#[derive(Clone)]
pub struct DailyChallengeService {
    store: Arc<dyn LocalStore>,
    quiz: Arc<QuizLoopService>,
}

impl DailyChallengeService {
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>, quiz: Arc<QuizLoopService>) -> Self {
        Self { store, quiz }
    }

    /// Date of the last completed challenge, if one is stored and readable.
    pub async fn last_completed(&self) -> Option<NaiveDate> {
        match self.store.get_item(keys::DAILY_CHALLENGE_COMPLETION).await {
            Ok(Some(raw)) => {
                let parsed = parse_challenge_date(&raw);
                if parsed.is_none() {
                    warn!(%raw, "ignoring unreadable daily challenge stamp");
                }
                parsed
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "could not read daily challenge stamp");
                None
            }
        }
    }

    pub async fn status(&self) -> DailyChallengeStatus {
        let today = self.quiz.clock().today();
        let last = self.last_completed().await;
        match last {
            Some(on) if !daily_challenge_available(last, today) => {
                DailyChallengeStatus::AlreadyCompleted { on }
            }
            _ => DailyChallengeStatus::Available,
        }
    }

    /// Start today's challenge.
    ///
    /// # Errors
    ///
    /// Returns `DailyChallengeError::AlreadyCompleted` if it was completed
    /// today, or `DailyChallengeError::Quiz` if questions cannot be built.
    pub async fn start(&self) -> Result<QuizSession, DailyChallengeError> {
        self.ensure_available().await?;
        let words = curated_words();
        let session =
            self.quiz
                .start_quiz(QuizKind::Daily, &words, &words, DAILY_CHALLENGE_QUESTIONS)?;
        Ok(session)
    }

    /// Answer the current question. Misses are recorded like any other quiz.
    ///
    /// # Errors
    ///
    /// Returns `DailyChallengeError::Flow` if the miss cannot be written.
    pub async fn answer(
        &self,
        session: &mut QuizSession,
        selected: &str,
    ) -> Result<Option<AnswerOutcome>, DailyChallengeError> {
        Ok(self.quiz.answer_current(session, selected).await?)
    }

    /// Move past the feedback screen; completing stamps today's date.
    ///
    /// The stamp is written before the result joins the quiz history, so a
    /// failed write leaves the session on its last question with nothing
    /// recorded.
    ///
    /// # Errors
    ///
    /// Returns `DailyChallengeError::AlreadyCompleted` when another run was
    /// finished today in the meantime, leaving `session` on its last question.
    pub async fn advance(
        &self,
        session: &mut QuizSession,
    ) -> Result<Option<QuizResult>, DailyChallengeError> {
        let today = self.quiz.clock().today();
        if session.is_on_last_question() {
            self.ensure_available().await?;
            self.store
                .set_item(
                    keys::DAILY_CHALLENGE_COMPLETION,
                    &format_challenge_date(today),
                )
                .await?;
        }

        let Some(result) = self.quiz.advance(session).await? else {
            return Ok(None);
        };
        info!(score = result.score, total = result.total, %today, "daily challenge completed");
        Ok(Some(result))
    }

    async fn ensure_available(&self) -> Result<(), DailyChallengeError> {
        match self.status().await {
            DailyChallengeStatus::Available => Ok(()),
            DailyChallengeStatus::AlreadyCompleted { .. } => Err(DailyChallengeError::AlreadyCompleted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use storage::repository::{InMemoryStore, StorageError};
    use vocab_core::Clock;
    use vocab_core::time::{fixed_clock, fixed_now};

    use crate::progress_store::ProgressStore;

    async fn service_with(store: Arc<InMemoryStore>, clock: Clock) -> DailyChallengeService {
        let progress = ProgressStore::load(store.clone(), clock).await;
        let quiz = QuizLoopService::new(clock, Arc::new(progress)).with_seed(5);
        DailyChallengeService::new(store, Arc::new(quiz))
    }

    async fn play_through(service: &DailyChallengeService, session: &mut QuizSession) -> QuizResult {
        loop {
            let answer = session.current_question().unwrap().answer().to_owned();
            service.answer(session, &answer).await.unwrap();
            if let Some(result) = service.advance(session).await.unwrap() {
                return result;
            }
        }
    }

    #[tokio::test]
    async fn completing_blocks_until_tomorrow() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store.clone(), fixed_clock()).await;
        assert_eq!(service.status().await, DailyChallengeStatus::Available);

        let mut session = service.start().await.unwrap();
        assert_eq!(session.total(), 5);
        let result = play_through(&service, &mut session).await;
        assert_eq!(result.score, 5);
        assert_eq!(result.kind, QuizKind::Daily);

        let today = fixed_clock().today();
        assert_eq!(
            service.status().await,
            DailyChallengeStatus::AlreadyCompleted { on: today }
        );
        assert!(matches!(
            service.start().await,
            Err(DailyChallengeError::AlreadyCompleted)
        ));

        let tomorrow = service_with(store, Clock::fixed(fixed_now() + Duration::days(1))).await;
        assert_eq!(tomorrow.status().await, DailyChallengeStatus::Available);
    }

    #[tokio::test]
    async fn second_run_started_the_same_day_cannot_complete() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store, fixed_clock()).await;
        let mut first = service.start().await.unwrap();
        let mut second = service.start().await.unwrap();

        play_through(&service, &mut first).await;

        for _ in 0..4 {
            let answer = second.current_question().unwrap().answer().to_owned();
            service.answer(&mut second, &answer).await.unwrap();
            service.advance(&mut second).await.unwrap();
        }
        let answer = second.current_question().unwrap().answer().to_owned();
        service.answer(&mut second, &answer).await.unwrap();
        assert!(matches!(
            service.advance(&mut second).await,
            Err(DailyChallengeError::AlreadyCompleted)
        ));
        assert!(!second.is_complete());
    }

    #[tokio::test]
    async fn legacy_timestamp_stamp_is_honoured() {
        let store = Arc::new(InMemoryStore::new());
        let stamp = fixed_now().to_rfc3339();
        store
            .set_item(keys::DAILY_CHALLENGE_COMPLETION, &stamp)
            .await
            .unwrap();
        let service = service_with(store, fixed_clock()).await;
        assert!(matches!(
            service.status().await,
            DailyChallengeStatus::AlreadyCompleted { .. }
        ));
    }

    /// Refuses to store the completion stamp.
    struct NoStampStore(InMemoryStore);

    #[async_trait]
    impl LocalStore for NoStampStore {
        async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == keys::DAILY_CHALLENGE_COMPLETION {
                return Err(StorageError::Connection("read-only".to_owned()));
            }
            self.0.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove_item(key).await
        }
    }

    #[tokio::test]
    async fn unstamped_completion_leaves_no_history() {
        let store = Arc::new(NoStampStore(InMemoryStore::new()));
        let progress = ProgressStore::load(store.clone(), fixed_clock()).await;
        let quiz = Arc::new(QuizLoopService::new(fixed_clock(), Arc::new(progress)).with_seed(5));
        let service = DailyChallengeService::new(store, quiz.clone());

        let mut session = service.start().await.unwrap();
        for _ in 0..4 {
            let answer = session.current_question().unwrap().answer().to_owned();
            service.answer(&mut session, &answer).await.unwrap();
            service.advance(&mut session).await.unwrap();
        }
        let answer = session.current_question().unwrap().answer().to_owned();
        service.answer(&mut session, &answer).await.unwrap();

        assert!(matches!(
            service.advance(&mut session).await,
            Err(DailyChallengeError::Storage(_))
        ));
        assert!(!session.is_complete());
        assert!(quiz.progress().snapshot().await.history().is_empty());
        assert_eq!(service.status().await, DailyChallengeStatus::Available);
    }
}
