//! Timed meaning-match game.
//!
//! The player picks a difficulty, then plays levels of five questions
//! against a per-question countdown. A correct answer is worth the seconds
//! left on the clock. A level is passed only with every answer correct;
//! otherwise the same level number is replayed with fresh questions.

use std::sync::Arc;

use tracing::debug;

use vocab_core::model::{Dataset, Difficulty, Question, QuizError, QuizKind};

use crate::error::GameError;
use crate::high_scores::HighScoreService;
use crate::quiz::{AnswerOutcome, QuestionTimer, QuizLoopService, QuizSession, TimerExpired};

/// Questions per level, clamped to the dataset size.
pub const QUESTIONS_PER_LEVEL: usize = 5;

/// How a finished level went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelOutcome {
    pub level: u32,
    pub correct: u32,
    pub total: u32,
    pub passed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    ChoosingDifficulty,
    Playing,
    LevelComplete(LevelOutcome),
}

/// Result of one answered or timed-out question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    pub answer: AnswerOutcome,
    pub points: u32,
    pub score: u32,
    pub new_high_score: bool,
}

/// What `next` moved the game to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStep {
    NextQuestion,
    LevelComplete(LevelOutcome),
}

pub struct MeaningMatchGame {
    quiz: Arc<QuizLoopService>,
    high_scores: Arc<HighScoreService>,
    dataset: Dataset,
    difficulty: Option<Difficulty>,
    level: u32,
    score: u32,
    high_score: u32,
    session: Option<QuizSession>,
    timer: Option<QuestionTimer>,
    phase: GamePhase,
}

impl MeaningMatchGame {
    /// # Errors
    ///
    /// Returns `GameError::DataShape` if `dataset` has fewer than four words.
    pub fn new(
        quiz: Arc<QuizLoopService>,
        high_scores: Arc<HighScoreService>,
        dataset: Dataset,
    ) -> Result<Self, GameError> {
        Ok(Self {
            quiz,
            high_scores,
            dataset: dataset.require_playable()?,
            difficulty: None,
            level: 1,
            score: 0,
            high_score: 0,
            session: None,
            timer: None,
            phase: GamePhase::ChoosingDifficulty,
        })
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref().and_then(QuizSession::current_question)
    }

    /// Seconds left on the running countdown, 0 when none is running.
    #[must_use]
    pub fn seconds_left(&self) -> u32 {
        self.timer.as_ref().map_or(0, QuestionTimer::remaining_secs)
    }

    /// Begin level 1 at `difficulty` with a zero score.
    ///
    /// # Errors
    ///
    /// Returns `GameError` if the first level cannot be built.
    pub async fn start(&mut self, difficulty: Difficulty) -> Result<(), GameError> {
        self.high_score = self.high_scores.get(difficulty).await;
        self.difficulty = Some(difficulty);
        self.level = 1;
        self.score = 0;
        debug!(%difficulty, high_score = self.high_score, "game started");
        self.start_level()
    }

    /// Answer the current question, scoring the seconds left if correct.
    ///
    /// Returns `Ok(None)` when no question is awaiting an answer.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NotStarted` before a difficulty is chosen, or a
    /// persistence error for the miss or high score.
    pub async fn answer(&mut self, selected: &str) -> Result<Option<RoundOutcome>, GameError> {
        let seconds_left = self.seconds_left();
        let session = self.session.as_mut().ok_or(GameError::NotStarted)?;
        let Some(answer) = self.quiz.answer_current(session, selected).await? else {
            return Ok(None);
        };
        self.timer = None;

        let points = if answer.feedback.is_correct() {
            seconds_left
        } else {
            0
        };
        self.finish_round(answer, points).await.map(Some)
    }

    /// Handle an expired countdown. Stale expiries are ignored.
    ///
    /// # Errors
    ///
    /// Returns `GameError` if the miss cannot be written.
    pub async fn on_timer_expired(
        &mut self,
        expired: TimerExpired,
    ) -> Result<Option<RoundOutcome>, GameError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        let Some(answer) = self
            .quiz
            .expire_current(session, expired.question_index)
            .await?
        else {
            return Ok(None);
        };
        self.timer = None;
        self.finish_round(answer, 0).await.map(Some)
    }

    /// Wait for the running countdown. Pending forever when none is running.
    pub async fn wait_for_timer(&mut self) -> TimerExpired {
        let fired = match self.timer.as_mut() {
            Some(timer) => timer.expired().await,
            None => None,
        };
        match fired {
            Some(expired) => expired,
            None => std::future::pending().await,
        }
    }

    /// Leave the feedback screen: next question, or the level summary.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Quiz` if no feedback is on screen.
    pub async fn next(&mut self) -> Result<GameStep, GameError> {
        let session = self.session.as_mut().ok_or(GameError::NotStarted)?;
        let Some(result) = self.quiz.advance(session).await? else {
            self.arm_timer();
            return Ok(GameStep::NextQuestion);
        };

        let outcome = LevelOutcome {
            level: self.level,
            correct: result.score,
            total: result.total,
            passed: result.is_perfect(),
        };
        debug!(?outcome, "level finished");
        self.timer = None;
        self.phase = GamePhase::LevelComplete(outcome);
        Ok(GameStep::LevelComplete(outcome))
    }

    /// From the level summary, start the next level or replay this one.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Quiz` unless a level summary is showing.
    pub fn continue_after_level(&mut self) -> Result<(), GameError> {
        let GamePhase::LevelComplete(outcome) = self.phase else {
            return Err(QuizError::InvalidTransition {
                action: "continue",
                state: "playing",
            }
            .into());
        };
        if outcome.passed {
            self.level += 1;
        }
        self.start_level()
    }

    /// Drop the current run and return to difficulty selection.
    pub fn restart(&mut self) {
        self.timer = None;
        self.session = None;
        self.difficulty = None;
        self.level = 1;
        self.score = 0;
        self.phase = GamePhase::ChoosingDifficulty;
    }

    fn start_level(&mut self) -> Result<(), GameError> {
        let entries = self.dataset.entries();
        let session =
            self.quiz
                .start_quiz(QuizKind::Custom, entries, entries, QUESTIONS_PER_LEVEL)?;
        self.session = Some(session);
        self.phase = GamePhase::Playing;
        self.arm_timer();
        Ok(())
    }

    fn arm_timer(&mut self) {
        let index = self.session.as_ref().and_then(QuizSession::current_index);
        self.timer = match (index, self.difficulty) {
            (Some(index), Some(difficulty)) => {
                Some(QuestionTimer::start(index, difficulty.time_limit()))
            }
            _ => None,
        };
    }

    async fn finish_round(
        &mut self,
        answer: AnswerOutcome,
        points: u32,
    ) -> Result<RoundOutcome, GameError> {
        self.score += points;
        let new_high_score = self.score > self.high_score;
        if new_high_score {
            self.high_score = self.score;
            if let Some(difficulty) = self.difficulty {
                self.high_scores.submit(difficulty, self.score).await?;
            }
        }
        Ok(RoundOutcome {
            answer,
            points,
            score: self.score,
            new_high_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use storage::repository::InMemoryStore;
    use vocab_core::model::WordEntry;
    use vocab_core::time::fixed_clock;

    use crate::progress_store::ProgressStore;
    use crate::quiz::Feedback;

    fn dataset(n: usize) -> Dataset {
        (0..n)
            .map(|i| WordEntry::new(format!("word{i}"), format!("meaning {i}")))
            .collect()
    }

    async fn game(n: usize) -> (MeaningMatchGame, Arc<HighScoreService>, Arc<QuizLoopService>) {
        let store = Arc::new(InMemoryStore::new());
        let progress = ProgressStore::load(store.clone(), fixed_clock()).await;
        let quiz = Arc::new(QuizLoopService::new(fixed_clock(), Arc::new(progress)).with_seed(8));
        let high_scores = Arc::new(HighScoreService::new(store));
        let game = MeaningMatchGame::new(quiz.clone(), high_scores.clone(), dataset(n)).unwrap();
        (game, high_scores, quiz)
    }

    fn correct(game: &MeaningMatchGame) -> String {
        game.current_question().unwrap().answer().to_owned()
    }

    fn wrong(game: &MeaningMatchGame) -> String {
        let question = game.current_question().unwrap();
        question
            .options()
            .iter()
            .find(|o| !question.is_correct(o))
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn too_small_dataset_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let progress = ProgressStore::load(store.clone(), fixed_clock()).await;
        let quiz = Arc::new(QuizLoopService::new(fixed_clock(), Arc::new(progress)));
        let result = MeaningMatchGame::new(
            quiz,
            Arc::new(HighScoreService::new(store)),
            dataset(3),
        );
        assert!(matches!(result, Err(GameError::DataShape(_))));
    }

    #[tokio::test]
    async fn answering_before_start_fails() {
        let (mut game, _, _) = game(6).await;
        assert!(matches!(game.answer("word0").await, Err(GameError::NotStarted)));
    }

    #[tokio::test(start_paused = true)]
    async fn correct_answer_scores_seconds_left() {
        let (mut game, high_scores, _) = game(6).await;
        game.start(Difficulty::Medium).await.unwrap();
        assert_eq!(game.seconds_left(), 15);

        tokio::time::advance(Duration::from_secs(4)).await;
        let answer = correct(&game);
        let round = game.answer(&answer).await.unwrap().unwrap();
        assert_eq!(round.points, 11);
        assert_eq!(round.score, 11);
        assert!(round.new_high_score);
        assert_eq!(high_scores.get(Difficulty::Medium).await, 11);
        assert_eq!(game.seconds_left(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_is_a_miss_and_fails_the_level() {
        let (mut game, _, quiz) = game(6).await;
        game.start(Difficulty::Hard).await.unwrap();
        let missed = correct(&game);

        let expired = game.wait_for_timer().await;
        assert_eq!(expired.question_index, 0);
        let round = game.on_timer_expired(expired).await.unwrap().unwrap();
        assert_eq!(round.answer.feedback, Feedback::Incorrect);
        assert_eq!(round.points, 0);
        assert_eq!(quiz.progress().snapshot().await.get(&missed).unwrap().missed_count, 1);

        // A repeated expiry for the same question changes nothing.
        assert!(game.on_timer_expired(expired).await.unwrap().is_none());

        let mut step = game.next().await.unwrap();
        while step == GameStep::NextQuestion {
            let answer = correct(&game);
            game.answer(&answer).await.unwrap();
            step = game.next().await.unwrap();
        }
        let GameStep::LevelComplete(outcome) = step else {
            unreachable!()
        };
        assert!(!outcome.passed);
        assert_eq!((outcome.correct, outcome.total), (4, 5));

        game.continue_after_level().unwrap();
        assert_eq!(game.level(), 1);
        assert_eq!(game.phase(), GamePhase::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn perfect_level_advances_and_keeps_high_score() {
        let (mut game, high_scores, _) = game(8).await;
        high_scores.submit(Difficulty::Easy, 500).await.unwrap();
        game.start(Difficulty::Easy).await.unwrap();
        assert_eq!(game.high_score(), 500);

        loop {
            let answer = correct(&game);
            let round = game.answer(&answer).await.unwrap().unwrap();
            assert_eq!(round.points, 20);
            assert!(!round.new_high_score);
            if let GameStep::LevelComplete(outcome) = game.next().await.unwrap() {
                assert!(outcome.passed);
                break;
            }
        }
        assert_eq!(game.score(), 100);
        game.continue_after_level().unwrap();
        assert_eq!(game.level(), 2);
        assert_eq!(high_scores.get(Difficulty::Easy).await, 500);
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_answer_scores_nothing_and_restart_resets() {
        let (mut game, _, _) = game(6).await;
        game.start(Difficulty::Easy).await.unwrap();
        let answer = wrong(&game);
        let round = game.answer(&answer).await.unwrap().unwrap();
        assert_eq!(round.points, 0);
        assert!(game.answer(&answer).await.unwrap().is_none());

        game.restart();
        assert_eq!(game.phase(), GamePhase::ChoosingDifficulty);
        assert_eq!(game.difficulty(), None);
        assert!(game.current_question().is_none());
    }
}
