use chrono::{DateTime, Utc};
use vocab_core::model::{Question, QuizError, QuizKind, QuizResult, WordEntry};

use super::progress::QuizProgress;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Whether the last submitted answer matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect,
}

impl Feedback {
    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// Lifecycle of a quiz.
///
/// `AwaitingStart -> InProgress -> Feedback -> (InProgress | Completed)`.
/// `score` always counts correct answers given so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    AwaitingStart,
    InProgress { index: usize, score: u32 },
    Feedback {
        index: usize,
        score: u32,
        feedback: Feedback,
    },
    Completed { score: u32, total: u32 },
}

impl QuizState {
    fn name(&self) -> &'static str {
        match self {
            Self::AwaitingStart => "awaiting start",
            Self::InProgress { .. } => "in progress",
            Self::Feedback { .. } => "showing feedback",
            Self::Completed { .. } => "completed",
        }
    }
}

/// Side effect a transition asks the caller to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEffect {
    RecordMiss(WordEntry),
    RecordCompletion(QuizResult),
}

/// One answer given during the quiz. `selected` is `None` when the timer ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub selected: Option<String>,
    pub feedback: Feedback,
    pub answered_at: DateTime<Utc>,
}

/// Result of submitting an answer to the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_index: usize,
    pub feedback: Feedback,
    pub correct_answer: String,
    pub effect: Option<QuizEffect>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Pure quiz state machine. Persistence is left to the caller through
/// the returned `QuizEffect`s.
#[derive(Debug, Clone)]
pub struct QuizSession {
    kind: QuizKind,
    questions: Vec<Question>,
    state: QuizState,
    answers: Vec<AnswerRecord>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    #[must_use]
    pub fn new(kind: QuizKind) -> Self {
        Self {
            kind,
            questions: Vec::new(),
            state: QuizState::AwaitingStart,
            answers: Vec::new(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Load the question list and show the first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` for an empty list and
    /// `QuizError::InvalidTransition` if the quiz was already started.
    pub fn start(&mut self, questions: Vec<Question>, at: DateTime<Utc>) -> Result<(), QuizError> {
        if self.state != QuizState::AwaitingStart {
            return Err(self.invalid("start"));
        }
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }
        self.questions = questions;
        self.state = QuizState::InProgress { index: 0, score: 0 };
        self.started_at = Some(at);
        Ok(())
    }

    #[must_use]
    pub fn kind(&self) -> QuizKind {
        self.kind
    }

    #[must_use]
    pub fn state(&self) -> &QuizState {
        &self.state
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Index of the question on screen, while one is on screen.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            QuizState::InProgress { index, .. } | QuizState::Feedback { index, .. } => Some(index),
            QuizState::AwaitingStart | QuizState::Completed { .. } => None,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current_index().and_then(|index| self.questions.get(index))
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        match self.state {
            QuizState::AwaitingStart => 0,
            QuizState::InProgress { score, .. }
            | QuizState::Feedback { score, .. }
            | QuizState::Completed { score, .. } => score,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    /// True while the last question's feedback is on screen.
    #[must_use]
    pub fn is_on_last_question(&self) -> bool {
        matches!(self.state, QuizState::Feedback { index, .. } if index + 1 == self.questions.len())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, QuizState::Completed { .. })
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let total = self.questions.len();
        let answered = self.answers.len();
        QuizProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            score: self.score(),
            is_complete: self.is_complete(),
        }
    }

    /// Submit `selected` for the current question.
    ///
    /// Returns `None` when no question is awaiting an answer, which makes
    /// duplicate submissions harmless.
    pub fn answer(&mut self, selected: &str, at: DateTime<Utc>) -> Option<AnswerOutcome> {
        self.submit(Some(selected), at)
    }

    /// Treat the timer for `question_index` as expired.
    ///
    /// A late expiry for a question that is no longer current does nothing.
    pub fn expire(&mut self, question_index: usize, at: DateTime<Utc>) -> Option<AnswerOutcome> {
        match self.state {
            QuizState::InProgress { index, .. } if index == question_index => self.submit(None, at),
            _ => None,
        }
    }

    /// Leave the feedback screen, moving to the next question or completing.
    ///
    /// Completing yields a `QuizEffect::RecordCompletion`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidTransition` unless feedback is on screen.
    pub fn advance(&mut self, at: DateTime<Utc>) -> Result<Option<QuizEffect>, QuizError> {
        let QuizState::Feedback { index, score, .. } = self.state else {
            return Err(self.invalid("advance"));
        };

        let next = index + 1;
        if next < self.questions.len() {
            self.state = QuizState::InProgress { index: next, score };
            return Ok(None);
        }

        let total = self.total();
        self.state = QuizState::Completed { score, total };
        self.completed_at = Some(at);
        Ok(Some(QuizEffect::RecordCompletion(QuizResult::new(
            score, total, at, self.kind,
        ))))
    }

    fn submit(&mut self, selected: Option<&str>, at: DateTime<Utc>) -> Option<AnswerOutcome> {
        let QuizState::InProgress { index, score } = self.state else {
            return None;
        };
        let question = self.questions.get(index)?;

        let correct = selected.is_some_and(|word| question.is_correct(word));
        let (feedback, score, effect) = if correct {
            (Feedback::Correct, score + 1, None)
        } else {
            let missed = question.answer_entry().clone();
            (Feedback::Incorrect, score, Some(QuizEffect::RecordMiss(missed)))
        };
        let correct_answer = question.answer().to_owned();

        self.answers.push(AnswerRecord {
            question_index: index,
            selected: selected.map(str::to_owned),
            feedback,
            answered_at: at,
        });
        self.state = QuizState::Feedback {
            index,
            score,
            feedback,
        };

        Some(AnswerOutcome {
            question_index: index,
            feedback,
            correct_answer,
            effect,
        })
    }

    fn invalid(&self, action: &'static str) -> QuizError {
        QuizError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocab_core::time::fixed_now;

    fn question(word: &str) -> Question {
        let mut options: Vec<String> = ["alpha", "beta", "gamma"]
            .iter()
            .map(|w| (*w).to_owned())
            .collect();
        options.push(word.to_owned());
        Question::new(WordEntry::new(word, format!("meaning of {word}")), options).unwrap()
    }

    fn started(words: &[&str]) -> QuizSession {
        let mut session = QuizSession::new(QuizKind::Custom);
        session
            .start(words.iter().map(|w| question(w)).collect(), fixed_now())
            .unwrap();
        session
    }

    #[test]
    fn starts_on_first_question() {
        let session = started(&["candid", "terse"]);
        assert_eq!(session.state(), &QuizState::InProgress { index: 0, score: 0 });
        assert_eq!(session.current_question().unwrap().answer(), "candid");
        assert_eq!(session.progress().remaining, 2);
    }

    #[test]
    fn start_rejects_empty_and_restart() {
        let mut session = QuizSession::new(QuizKind::Custom);
        assert_eq!(session.start(Vec::new(), fixed_now()), Err(QuizError::Empty));

        let mut session = started(&["candid"]);
        let err = session.start(vec![question("terse")], fixed_now()).unwrap_err();
        assert!(matches!(err, QuizError::InvalidTransition { action: "start", .. }));
    }

    #[test]
    fn correct_answer_scores_without_effect() {
        let mut session = started(&["candid", "terse"]);
        let outcome = session.answer("candid", fixed_now()).unwrap();
        assert_eq!(outcome.feedback, Feedback::Correct);
        assert_eq!(outcome.effect, None);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn wrong_answer_asks_to_record_miss() {
        let mut session = started(&["candid", "terse"]);
        let outcome = session.answer("alpha", fixed_now()).unwrap();
        assert_eq!(outcome.feedback, Feedback::Incorrect);
        assert_eq!(outcome.correct_answer, "candid");
        assert_eq!(
            outcome.effect,
            Some(QuizEffect::RecordMiss(WordEntry::new("candid", "meaning of candid")))
        );
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn second_answer_during_feedback_is_ignored() {
        let mut session = started(&["candid", "terse"]);
        session.answer("alpha", fixed_now()).unwrap();
        assert!(session.answer("candid", fixed_now()).is_none());
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn expiry_counts_as_incorrect_only_for_current_question() {
        let mut session = started(&["candid", "terse"]);
        assert!(session.expire(1, fixed_now()).is_none());

        let outcome = session.expire(0, fixed_now()).unwrap();
        assert_eq!(outcome.feedback, Feedback::Incorrect);
        assert!(matches!(outcome.effect, Some(QuizEffect::RecordMiss(_))));
        assert_eq!(session.answers()[0].selected, None);

        // Late expiry after the answer was already given.
        assert!(session.expire(0, fixed_now()).is_none());
    }

    #[test]
    fn advance_walks_to_completion() {
        let mut session = started(&["candid", "terse"]);
        assert!(session.advance(fixed_now()).is_err());

        session.answer("candid", fixed_now()).unwrap();
        assert!(!session.is_on_last_question());
        assert_eq!(session.advance(fixed_now()).unwrap(), None);

        session.answer("beta", fixed_now()).unwrap();
        assert!(session.is_on_last_question());
        let effect = session.advance(fixed_now()).unwrap();
        assert_eq!(
            effect,
            Some(QuizEffect::RecordCompletion(QuizResult::new(
                1,
                2,
                fixed_now(),
                QuizKind::Custom
            )))
        );
        assert_eq!(session.state(), &QuizState::Completed { score: 1, total: 2 });
        assert!(session.current_question().is_none());
        assert!(session.advance(fixed_now()).is_err());
    }
}
